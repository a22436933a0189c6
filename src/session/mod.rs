//! Session lifecycle: data model, persistence, expiry scheduling.
//!
//! A [`Session`] is the authenticated state bundle persisted across app
//! restarts; a [`PendingSelection`] is the short-lived artifact between a
//! first-factor login and account confirmation. [`SessionService`] is the
//! public surface the rest of the crate (and the host app) goes through.

pub mod expiry;
pub mod service;
pub mod store;
pub mod token;

pub use expiry::{ExpiryScheduler, ExpiryState};
pub use service::SessionService;
pub use store::SessionStore;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An authenticated session: the bearer credential plus whatever profile
/// blob the backend attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    /// Free-form profile data. Structurally heterogeneous across backends;
    /// resolved defensively through [`crate::tracking::resolver`].
    #[serde(default)]
    pub profile: Option<Value>,
    /// Decoded credential expiry, epoch milliseconds. `None` means the
    /// credential never expires (or its expiry could not be decoded).
    #[serde(default)]
    pub expires_at_ms: Option<i64>,
}

impl Session {
    /// Build a session from a freshly issued credential, decoding its
    /// expiry. Decoding failure is not an error: the session simply has no
    /// known expiry.
    pub fn new(access_token: impl Into<String>, profile: Option<Value>) -> Self {
        let access_token = access_token.into();
        let expires_at_ms = token::decode_expiry_ms(&access_token);
        Self {
            access_token,
            profile,
            expires_at_ms,
        }
    }

    /// Whether the session's credential has expired as of `now_ms`.
    /// Sessions without a decoded expiry never expire.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        match self.expires_at_ms {
            Some(expires_at_ms) => now_ms >= expires_at_ms,
            None => false,
        }
    }

    /// Subject identifier embedded in the credential, if decodable.
    pub fn subject(&self) -> Option<String> {
        token::decode_subject(&self.access_token)
    }
}

/// One candidate account offered after a first-factor login that matched
/// several vendor/tenant pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAccount {
    /// Backends send ids as strings or numbers; kept raw and normalized
    /// through the accessors.
    #[serde(default)]
    pub vendor_id: Option<Value>,
    #[serde(default)]
    pub tenant_id: Option<Value>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
}

impl CandidateAccount {
    pub fn vendor_id_str(&self) -> Option<String> {
        self.vendor_id.as_ref().and_then(crate::tracking::resolver::id_string)
    }

    pub fn tenant_id_str(&self) -> Option<String> {
        self.tenant_id.as_ref().and_then(crate::tracking::resolver::id_string)
    }
}

/// Pre-authentication state between first-factor login and account
/// confirmation. At most one exists at a time; consumed on confirmation,
/// discarded on logout or replaced by a newer login attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSelection {
    pub temp_token: String,
    #[serde(default)]
    pub subject_profile: Option<Value>,
    #[serde(default)]
    pub accounts: Vec<CandidateAccount>,
    pub created_at_ms: i64,
}
