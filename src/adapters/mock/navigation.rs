//! Navigation double that counts resets.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::traits::Navigator;

/// [`Navigator`] that records how many times the stack was reset.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    resets: AtomicUsize,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn reset_to_entry_point(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}
