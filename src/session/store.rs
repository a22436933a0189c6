//! Session and pending-selection persistence.
//!
//! The store is the only component that touches the persisted session
//! keys. Envelopes are written as single JSON documents under
//! [`crate::config::keys::SESSION`] and
//! [`crate::config::keys::PENDING_SELECTION`]; a set of flat legacy keys is
//! mirrored alongside for older call sites but never read back.
//!
//! Storage failures are recovered here: saves log and carry on, loads treat
//! unreadable content as absence.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{CandidateAccount, PendingSelection, Session};
use crate::config::keys;
use crate::tracking::resolver;
use crate::traits::KeyValueStore;

pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Persist a freshly issued credential and its profile, returning the
    /// decoded session. Never fails: a malformed credential saves with no
    /// expiry, and storage errors are logged and swallowed.
    pub async fn save_session(
        &self,
        access_token: &str,
        profile: Option<Value>,
    ) -> Session {
        let session = Session::new(access_token, profile);

        match serde_json::to_string(&session) {
            Ok(json) => {
                if let Err(err) = self.storage.set(keys::SESSION, &json).await {
                    warn!("failed to persist session: {}", err);
                }
            }
            Err(err) => warn!("failed to encode session: {}", err),
        }

        self.write_legacy_mirrors(&session).await;
        session
    }

    /// Load the persisted session. Absent or unparsable content is `None`.
    pub async fn load_session(&self) -> Option<Session> {
        let raw = match self.storage.get(keys::SESSION).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("failed to read session: {}", err);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!("persisted session is unparsable, treating as absent: {}", err);
                None
            }
        }
    }

    /// Remove the persisted session and its legacy mirrors. Idempotent.
    pub async fn clear_session(&self) {
        for key in [
            keys::SESSION,
            keys::LEGACY_ACCESS_TOKEN,
            keys::LEGACY_DRIVER_ID,
            keys::LEGACY_TENANT_ID,
            keys::LEGACY_VENDOR_ID,
        ] {
            if let Err(err) = self.storage.remove(key).await {
                warn!(key, "failed to remove session key: {}", err);
            }
        }
    }

    pub async fn save_pending_selection(
        &self,
        temp_token: &str,
        subject_profile: Option<Value>,
        accounts: Vec<CandidateAccount>,
    ) {
        let pending = PendingSelection {
            temp_token: temp_token.to_string(),
            subject_profile,
            accounts,
            created_at_ms: chrono::Utc::now().timestamp_millis(),
        };
        match serde_json::to_string(&pending) {
            Ok(json) => {
                if let Err(err) = self.storage.set(keys::PENDING_SELECTION, &json).await {
                    warn!("failed to persist pending selection: {}", err);
                }
            }
            Err(err) => warn!("failed to encode pending selection: {}", err),
        }
    }

    pub async fn load_pending_selection(&self) -> Option<PendingSelection> {
        let raw = match self.storage.get(keys::PENDING_SELECTION).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("failed to read pending selection: {}", err);
                return None;
            }
        };
        serde_json::from_str(&raw).ok()
    }

    pub async fn clear_pending_selection(&self) {
        if let Err(err) = self.storage.remove(keys::PENDING_SELECTION).await {
            warn!("failed to remove pending selection: {}", err);
        }
    }

    /// Mirror the credential and resolved identifiers to flat keys.
    /// Best-effort only: these keys satisfy legacy call sites and are not
    /// authoritative, so every failure is swallowed.
    async fn write_legacy_mirrors(&self, session: &Session) {
        if let Err(err) = self
            .storage
            .set(keys::LEGACY_ACCESS_TOKEN, &session.access_token)
            .await
        {
            debug!("legacy token mirror write failed: {}", err);
        }

        let Some(profile) = session.profile.as_ref() else {
            return;
        };

        let mirrors = [
            (keys::LEGACY_DRIVER_ID, resolver::resolve_driver_id(profile)),
            (keys::LEGACY_TENANT_ID, resolver::resolve_tenant_id(profile)),
            (keys::LEGACY_VENDOR_ID, resolver::resolve_vendor_id(profile)),
        ];
        for (key, value) in mirrors {
            if let Some(value) = value {
                if let Err(err) = self.storage.set(key, &value).await {
                    debug!(key, "legacy mirror write failed: {}", err);
                }
            }
        }
    }
}
