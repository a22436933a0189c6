//! OS location client trait abstraction.
//!
//! Wraps the platform location APIs: position fixes bounded by a timeout,
//! and the two independent permission axes (foreground and background).
//! The host application supplies the platform binding; tests use
//! [`crate::adapters::mock::MockLocationClient`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Requested fix accuracy. Reporting always asks for [`Accuracy::High`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    Low,
    Balanced,
    High,
}

/// One device position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported horizontal accuracy in meters, when the OS provides one.
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    /// When the fix was sampled, epoch milliseconds.
    pub sampled_at_ms: i64,
}

/// State of one permission axis as last reported by the OS.
///
/// `can_ask_again == false` means the OS will no longer show a prompt and
/// the user must visit system settings to change the grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGrant {
    pub granted: bool,
    pub can_ask_again: bool,
}

impl PermissionGrant {
    pub fn granted() -> Self {
        Self {
            granted: true,
            can_ask_again: true,
        }
    }

    pub fn denied(can_ask_again: bool) -> Self {
        Self {
            granted: false,
            can_ask_again,
        }
    }
}

/// Position acquisition errors.
#[derive(Debug, Clone)]
pub enum PositionError {
    /// No fix within the allotted time.
    Timeout { timeout: Duration },
    /// Location services are disabled device-wide.
    ServicesDisabled,
    /// The OS refused or failed the request.
    Unavailable(String),
}

impl std::fmt::Display for PositionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionError::Timeout { timeout } => {
                write!(f, "No position fix within {:?}", timeout)
            }
            PositionError::ServicesDisabled => write!(f, "Location services are disabled"),
            PositionError::Unavailable(msg) => write!(f, "Position unavailable: {}", msg),
        }
    }
}

impl std::error::Error for PositionError {}

/// Trait for OS location and permission operations.
///
/// Permission queries must hit the OS fresh on every call; grants can be
/// revoked from system settings at any time without notification.
#[async_trait]
pub trait LocationClient: Send + Sync {
    /// Acquire the current device position, bounded by `timeout`.
    async fn current_position(
        &self,
        accuracy: Accuracy,
        timeout: Duration,
    ) -> Result<Position, PositionError>;

    /// Current foreground ("while in use") grant.
    async fn foreground_permission(&self) -> PermissionGrant;

    /// Current background ("all the time") grant.
    async fn background_permission(&self) -> PermissionGrant;

    /// Prompt for the foreground grant and return the resulting state.
    async fn request_foreground_permission(&self) -> PermissionGrant;

    /// Prompt for the background grant and return the resulting state.
    async fn request_background_permission(&self) -> PermissionGrant;

    /// Whether location services are enabled device-wide.
    async fn services_enabled(&self) -> bool;
}
