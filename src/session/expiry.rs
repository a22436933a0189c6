//! Credential expiry scheduling.
//!
//! One state machine, one timer: `Idle -> Armed -> Fired -> Idle`. Arming
//! while armed disarms the previous timer first, so at most one timer ever
//! exists. Firing clears the persisted session and resets the host
//! navigation to the unauthenticated entry point.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{store::SessionStore, Session};
use crate::config::MIN_EXPIRY_DELAY_MS;
use crate::traits::Navigator;

/// Scheduler states. `Fired` is observable only from within the firing
/// sequence; the machine returns to `Idle` once the forced logout is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryState {
    Idle,
    Armed,
    Fired,
}

struct SchedulerInner {
    state: ExpiryState,
    timer: Option<JoinHandle<()>>,
}

pub struct ExpiryScheduler {
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    inner: Mutex<SchedulerInner>,
    weak_self: Weak<Self>,
}

impl ExpiryScheduler {
    pub fn new(store: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            store,
            navigator,
            inner: Mutex::new(SchedulerInner {
                state: ExpiryState::Idle,
                timer: None,
            }),
            weak_self: weak_self.clone(),
        })
    }

    pub fn state(&self) -> ExpiryState {
        self.inner.lock().unwrap().state
    }

    /// Arm the scheduler against a session's decoded expiry.
    ///
    /// - no expiry: stays `Idle`, no timer (credential never expires)
    /// - expiry already passed: fires synchronously, no timer
    /// - otherwise: one-shot timer at `max(expiry - now, 1s)`
    pub async fn arm(&self, session: &Session) {
        self.disarm();

        let Some(expires_at_ms) = session.expires_at_ms else {
            debug!("credential carries no expiry; scheduler stays idle");
            return;
        };

        let now_ms = chrono::Utc::now().timestamp_millis();
        let delay_ms = expires_at_ms - now_ms;
        if delay_ms <= 0 {
            warn!("credential already expired at arm time");
            self.fire().await;
            return;
        }

        let delay = Duration::from_millis(delay_ms.max(MIN_EXPIRY_DELAY_MS) as u64);
        let weak = self.weak_self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(scheduler) = weak.upgrade() {
                scheduler.fire().await;
            }
        });

        let mut inner = self.inner.lock().unwrap();
        inner.timer = Some(handle);
        inner.state = ExpiryState::Armed;
        debug!(delay_ms = delay.as_millis() as u64, "expiry timer armed");
    }

    /// Cancel any pending timer and return to `Idle`. Called on logout and
    /// at the start of every re-arm.
    pub fn disarm(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.state = ExpiryState::Idle;
    }

    /// Forced logout: clear credentials, then reset navigation.
    async fn fire(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.state = ExpiryState::Fired;
            inner.timer = None;
        }
        warn!("session expired; clearing credentials");
        self.store.clear_session().await;
        self.navigator.reset_to_entry_point();
        self.inner.lock().unwrap().state = ExpiryState::Idle;
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.inner.lock().unwrap().timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MemoryStore, RecordingNavigator};
    use crate::config::keys;
    use crate::traits::KeyValueStore;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde_json::json;

    struct Fixture {
        storage: Arc<MemoryStore>,
        navigator: Arc<RecordingNavigator>,
        store: Arc<SessionStore>,
        scheduler: Arc<ExpiryScheduler>,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(MemoryStore::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let store = Arc::new(SessionStore::new(storage.clone() as Arc<dyn KeyValueStore>));
        let scheduler = ExpiryScheduler::new(store.clone(), navigator.clone() as Arc<dyn Navigator>);
        Fixture {
            storage,
            navigator,
            store,
            scheduler,
        }
    }

    fn token_expiring_in(offset_ms: i64) -> String {
        let exp_secs = (chrono::Utc::now().timestamp_millis() + offset_ms) / 1000;
        let body = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&json!({"exp": exp_secs})).unwrap());
        format!("h.{}.s", body)
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_fires_at_expiry() {
        let f = fixture();
        let session = f.store.save_session(&token_expiring_in(5_000), None).await;
        f.scheduler.arm(&session).await;
        assert_eq!(f.scheduler.state(), ExpiryState::Armed);

        tokio::time::sleep(Duration::from_millis(5_100)).await;

        assert_eq!(f.navigator.reset_count(), 1);
        assert_eq!(f.storage.get(keys::SESSION).await.unwrap(), None);
        assert_eq!(f.scheduler.state(), ExpiryState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_expiry_fires_synchronously() {
        let f = fixture();
        let session = f.store.save_session(&token_expiring_in(-10_000), None).await;
        f.scheduler.arm(&session).await;

        // No clock advance: the firing already happened inside arm().
        assert_eq!(f.navigator.reset_count(), 1);
        assert_eq!(f.scheduler.state(), ExpiryState::Idle);
        assert_eq!(f.storage.get(keys::SESSION).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_expiry_stays_idle() {
        let f = fixture();
        let session = f.store.save_session("not-a-jwt", None).await;
        f.scheduler.arm(&session).await;
        assert_eq!(f.scheduler.state(), ExpiryState::Idle);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(f.navigator.reset_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_timer() {
        let f = fixture();
        let first = f.store.save_session(&token_expiring_in(5_000), None).await;
        f.scheduler.arm(&first).await;

        let second = f.store.save_session(&token_expiring_in(60_000), None).await;
        f.scheduler.arm(&second).await;

        // The first timer would have fired here; it must not.
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(f.navigator.reset_count(), 0);

        tokio::time::sleep(Duration::from_millis(51_000)).await;
        assert_eq!(f.navigator.reset_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_cancels_timer() {
        let f = fixture();
        let session = f.store.save_session(&token_expiring_in(5_000), None).await;
        f.scheduler.arm(&session).await;
        f.scheduler.disarm();
        assert_eq!(f.scheduler.state(), ExpiryState::Idle);

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(f.navigator.reset_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_near_expiry_clamps_to_minimum_delay() {
        let f = fixture();
        // Credential expiries have second granularity, so build the
        // sub-second case directly.
        let session = Session {
            access_token: "tok".to_string(),
            profile: None,
            expires_at_ms: Some(chrono::Utc::now().timestamp_millis() + 200),
        };
        f.scheduler.arm(&session).await;
        assert_eq!(f.scheduler.state(), ExpiryState::Armed);

        // Below the 1s clamp: must not have fired yet.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(f.navigator.reset_count(), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(f.navigator.reset_count(), 1);
    }
}
