//! Scriptable location client for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::traits::{Accuracy, LocationClient, PermissionGrant, Position, PositionError};

struct MockLocationState {
    foreground: PermissionGrant,
    background: PermissionGrant,
    foreground_request_outcome: PermissionGrant,
    background_request_outcome: PermissionGrant,
    position: Position,
    position_error: Option<PositionError>,
    services_enabled: bool,
    position_calls: usize,
    foreground_request_calls: usize,
    background_request_calls: usize,
}

/// Configurable [`LocationClient`] double. Defaults to fully granted
/// permissions and a fixed position fix.
pub struct MockLocationClient {
    state: Mutex<MockLocationState>,
}

impl MockLocationClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockLocationState {
                foreground: PermissionGrant::granted(),
                background: PermissionGrant::granted(),
                foreground_request_outcome: PermissionGrant::granted(),
                background_request_outcome: PermissionGrant::granted(),
                position: Position {
                    latitude: 12.9716,
                    longitude: 77.5946,
                    accuracy_m: Some(10.0),
                    sampled_at_ms: 1_700_000_000_000,
                },
                position_error: None,
                services_enabled: true,
                position_calls: 0,
                foreground_request_calls: 0,
                background_request_calls: 0,
            }),
        }
    }

    /// Script the grants returned by permission queries. A prompt outcome
    /// set through [`Self::set_request_outcomes`] also updates these.
    pub fn set_permissions(&self, foreground: PermissionGrant, background: PermissionGrant) {
        let mut state = self.state.lock().unwrap();
        state.foreground = foreground;
        state.background = background;
    }

    /// Script what a permission prompt yields.
    pub fn set_request_outcomes(&self, foreground: PermissionGrant, background: PermissionGrant) {
        let mut state = self.state.lock().unwrap();
        state.foreground_request_outcome = foreground;
        state.background_request_outcome = background;
    }

    pub fn set_position(&self, position: Position) {
        self.state.lock().unwrap().position = position;
    }

    /// Make position acquisition fail until cleared with `None`.
    pub fn set_position_error(&self, error: Option<PositionError>) {
        self.state.lock().unwrap().position_error = error;
    }

    pub fn set_services_enabled(&self, enabled: bool) {
        self.state.lock().unwrap().services_enabled = enabled;
    }

    pub fn position_calls(&self) -> usize {
        self.state.lock().unwrap().position_calls
    }

    pub fn foreground_request_calls(&self) -> usize {
        self.state.lock().unwrap().foreground_request_calls
    }

    pub fn background_request_calls(&self) -> usize {
        self.state.lock().unwrap().background_request_calls
    }
}

impl Default for MockLocationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationClient for MockLocationClient {
    async fn current_position(
        &self,
        _accuracy: Accuracy,
        _timeout: Duration,
    ) -> Result<Position, PositionError> {
        let mut state = self.state.lock().unwrap();
        state.position_calls += 1;
        match &state.position_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.position.clone()),
        }
    }

    async fn foreground_permission(&self) -> PermissionGrant {
        self.state.lock().unwrap().foreground
    }

    async fn background_permission(&self) -> PermissionGrant {
        self.state.lock().unwrap().background
    }

    async fn request_foreground_permission(&self) -> PermissionGrant {
        let mut state = self.state.lock().unwrap();
        state.foreground_request_calls += 1;
        let outcome = state.foreground_request_outcome;
        state.foreground = outcome;
        outcome
    }

    async fn request_background_permission(&self) -> PermissionGrant {
        let mut state = self.state.lock().unwrap();
        state.background_request_calls += 1;
        let outcome = state.background_request_outcome;
        state.background = outcome;
        outcome
    }

    async fn services_enabled(&self) -> bool {
        self.state.lock().unwrap().services_enabled
    }
}
