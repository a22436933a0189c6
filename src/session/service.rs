//! Public session surface: persistence plus expiry scheduling, kept in
//! lockstep. Saving a session re-arms the scheduler; clearing it disarms
//! first. Everything else in the crate reads the session through here.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::expiry::ExpiryScheduler;
use super::store::SessionStore;
use super::{CandidateAccount, PendingSelection, Session};
use crate::traits::{KeyValueStore, Navigator};

pub struct SessionService {
    store: Arc<SessionStore>,
    scheduler: Arc<ExpiryScheduler>,
}

impl SessionService {
    pub fn new(storage: Arc<dyn KeyValueStore>, navigator: Arc<dyn Navigator>) -> Arc<Self> {
        let store = Arc::new(SessionStore::new(storage));
        let scheduler = ExpiryScheduler::new(store.clone(), navigator);
        Arc::new(Self { store, scheduler })
    }

    /// Persist a new session and arm the expiry scheduler against it.
    /// Never fails; a credential without a decodable expiry leaves the
    /// scheduler idle.
    pub async fn save_session(&self, access_token: &str, profile: Option<Value>) -> Session {
        let session = self.store.save_session(access_token, profile).await;
        self.scheduler.arm(&session).await;
        session
    }

    pub async fn load_session(&self) -> Option<Session> {
        self.store.load_session().await
    }

    /// Logout-side clear: cancel the expiry timer, then drop the persisted
    /// session and its mirrors. Idempotent.
    pub async fn clear_session(&self) {
        self.scheduler.disarm();
        self.store.clear_session().await;
    }

    pub async fn save_pending_selection(
        &self,
        temp_token: &str,
        subject_profile: Option<Value>,
        accounts: Vec<CandidateAccount>,
    ) {
        self.store
            .save_pending_selection(temp_token, subject_profile, accounts)
            .await;
    }

    pub async fn load_pending_selection(&self) -> Option<PendingSelection> {
        self.store.load_pending_selection().await
    }

    pub async fn clear_pending_selection(&self) {
        self.store.clear_pending_selection().await;
    }

    /// Process-start restore: re-arm against whatever session survived the
    /// restart. An already-expired session is cleared immediately by the
    /// scheduler's synchronous firing path.
    pub async fn restore(&self) {
        match self.store.load_session().await {
            Some(session) => {
                info!("restored persisted session");
                self.scheduler.arm(&session).await;
            }
            None => info!("no persisted session to restore"),
        }
    }

    /// Scheduler handle, exposed for status checks and tests.
    pub fn scheduler(&self) -> &Arc<ExpiryScheduler> {
        &self.scheduler
    }
}
