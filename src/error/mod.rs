//! Error handling for the coordinator.
//!
//! Seam-level errors live next to their traits ([`crate::traits`]); this
//! module holds the tracking domain errors and the category layer used for
//! handling decisions.
//!
//! # Propagation policy
//!
//! - Credential decoding and storage failures are recovered inside the
//!   session layer and never surface to callers.
//! - Position and transport failures inside a reporting cycle are logged
//!   and the cycle abandoned; the periodic loop never terminates because a
//!   single cycle failed.
//! - Only the reporter's pre-flight checks (permission, identity
//!   resolution) propagate an error to the caller of `start()`.
//! - Session expiry is a state transition (forced logout), not an error.

mod category;
mod tracking;

pub use category::ErrorCategory;
pub use tracking::TrackingError;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::traits::{PositionError, TransportError};
    use std::time::Duration;

    #[test]
    fn test_soft_errors_never_require_user_action() {
        let position: TrackingError = PositionError::Timeout {
            timeout: Duration::from_secs(15),
        }
        .into();
        let transport: TrackingError = TransportError::Network("offline".to_string()).into();

        for err in [position, transport] {
            assert!(err.is_soft(), "expected {:?} to be soft", err);
            assert!(!err.category().is_user_actionable());
        }
    }

    #[test]
    fn test_preflight_errors_are_hard() {
        let err = TrackingError::IdentityUnresolved {
            missing: vec!["vendor_id"],
        };
        assert!(!err.is_soft());
        assert!(!err.error_code().is_empty());
        assert!(!err.user_message().is_empty());
    }
}
