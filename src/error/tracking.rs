//! Location reporter error variants.

use super::category::ErrorCategory;
use crate::permission::PermissionSnapshot;
use crate::traits::{PositionError, TransportError};

/// Errors surfaced by the location reporter.
///
/// Only [`TrackingError::PermissionRequired`] and
/// [`TrackingError::IdentityUnresolved`] ever escape `start()`; the other
/// variants describe soft per-cycle failures that are logged and retried.
#[derive(Debug, Clone)]
pub enum TrackingError {
    /// Tracking cannot start without full location grants.
    PermissionRequired { snapshot: PermissionSnapshot },

    /// The session profile lacks required identifiers (or there is no
    /// session at all). `missing` names the unresolved identifiers.
    IdentityUnresolved { missing: Vec<&'static str> },

    /// The device produced no fix this cycle.
    Position(PositionError),

    /// Both transports failed for this cycle's publish.
    Transport(TransportError),
}

impl TrackingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TrackingError::PermissionRequired { .. } => ErrorCategory::Permission,
            TrackingError::IdentityUnresolved { .. } => ErrorCategory::Identity,
            TrackingError::Position(_) => ErrorCategory::Device,
            TrackingError::Transport(_) => ErrorCategory::Network,
        }
    }

    /// Soft errors abort one cycle without leaving the Running state.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            TrackingError::Position(_) | TrackingError::Transport(_)
        )
    }

    /// Short code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            TrackingError::PermissionRequired { .. } => "E_TRACK_PERMISSION",
            TrackingError::IdentityUnresolved { .. } => "E_TRACK_IDENTITY",
            TrackingError::Position(_) => "E_TRACK_POSITION",
            TrackingError::Transport(_) => "E_TRACK_TRANSPORT",
        }
    }

    /// User-facing message for the host UI.
    pub fn user_message(&self) -> String {
        match self {
            TrackingError::PermissionRequired { snapshot } => {
                if snapshot.needs_settings_visit() {
                    "Location permission was denied. Please enable it in system settings."
                        .to_string()
                } else {
                    "Location permission is required to start tracking.".to_string()
                }
            }
            TrackingError::IdentityUnresolved { missing } => format!(
                "Your session is missing account details ({}). Please sign in again.",
                missing.join(", ")
            ),
            TrackingError::Position(_) => {
                "Could not determine your position. Tracking will retry.".to_string()
            }
            TrackingError::Transport(_) => {
                "Could not report your position. Tracking will retry.".to_string()
            }
        }
    }
}

impl std::fmt::Display for TrackingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingError::PermissionRequired { snapshot } => write!(
                f,
                "Location permission required (foreground: {}, background: {})",
                snapshot.foreground.granted, snapshot.background.granted
            ),
            TrackingError::IdentityUnresolved { missing } => {
                write!(f, "Session profile unresolved: missing {}", missing.join(", "))
            }
            TrackingError::Position(err) => write!(f, "Position acquisition failed: {}", err),
            TrackingError::Transport(err) => write!(f, "Location publish failed: {}", err),
        }
    }
}

impl std::error::Error for TrackingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackingError::Position(err) => Some(err),
            TrackingError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PositionError> for TrackingError {
    fn from(err: PositionError) -> Self {
        TrackingError::Position(err)
    }
}

impl From<TransportError> for TrackingError {
    fn from(err: TransportError) -> Self {
        TrackingError::Transport(err)
    }
}
