//! Mock implementations for testing.
//!
//! Configurable test doubles for every seam, with recorded calls for
//! verification. All of them share state through `Arc` internally, so a
//! clone handed to a component and the handle kept by the test observe the
//! same calls.

pub mod location;
pub mod navigation;
pub mod storage;
pub mod transport;

pub use location::MockLocationClient;
pub use navigation::RecordingNavigator;
pub use storage::MemoryStore;
pub use transport::{MockBehavior, MockTransport, RecordedWrite};
