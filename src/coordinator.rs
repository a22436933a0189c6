//! Composition root.
//!
//! All services are constructed here once at process start with their
//! dependencies injected, then passed by reference to consumers. The host
//! app drives the coordinator from its lifecycle: `bootstrap` on launch,
//! `handle_foreground`/`handle_background` on app-state transitions, the
//! auth methods from its login screens, and `logout` from anywhere.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{AuthClient, AuthError, LoginOutcome, LoginSuccess};
use crate::config::RuntimeConfig;
use crate::error::TrackingError;
use crate::permission::PermissionMonitor;
use crate::session::{CandidateAccount, Session, SessionService};
use crate::tracking::LocationReporter;
use crate::transport::TransportSelector;
use crate::traits::{KeyValueStore, LocationClient, Navigator, RealtimeTransport};

/// Everything the coordinator needs injected: platform adapters, the two
/// transports, and tunables.
pub struct CoordinatorDeps {
    pub storage: Arc<dyn KeyValueStore>,
    pub location: Arc<dyn LocationClient>,
    pub navigator: Arc<dyn Navigator>,
    pub primary_transport: Arc<dyn RealtimeTransport>,
    pub fallback_transport: Arc<dyn RealtimeTransport>,
    pub config: RuntimeConfig,
}

pub struct Coordinator {
    pub session: Arc<SessionService>,
    pub monitor: Arc<PermissionMonitor>,
    pub reporter: Arc<LocationReporter>,
    pub selector: Arc<TransportSelector>,
    pub auth: AuthClient,
}

impl Coordinator {
    pub fn new(deps: CoordinatorDeps) -> Arc<Self> {
        let session = SessionService::new(deps.storage, deps.navigator);
        let monitor = PermissionMonitor::new(
            deps.location.clone(),
            deps.config.permission_poll_interval,
        );
        let selector = Arc::new(TransportSelector::new(
            deps.primary_transport,
            deps.fallback_transport,
        ));
        let reporter = LocationReporter::new(
            deps.location,
            monitor.clone(),
            session.clone(),
            selector.clone(),
            deps.config.report_interval,
            deps.config.position_timeout,
        );
        let auth = AuthClient::new(deps.config.api_base_url.clone());

        Arc::new(Self {
            session,
            monitor,
            reporter,
            selector,
            auth,
        })
    }

    /// Process-start restore: reload any persisted session and arm the
    /// expiry scheduler against it.
    pub async fn bootstrap(&self) {
        info!("coordinator bootstrap");
        self.session.restore().await;
    }

    /// Single-factor login. On success the session is persisted and the
    /// expiry scheduler armed.
    pub async fn sign_in(
        &self,
        tenant_id: &str,
        username: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let success = self.auth.login(tenant_id, username, password).await?;
        Ok(self.save_authenticated(success).await)
    }

    /// First-factor login. A multi-account identity produces a persisted
    /// pending selection awaiting [`Self::confirm_account`]; a direct
    /// credential becomes a full session immediately.
    pub async fn begin_sign_in(
        &self,
        license_number: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let outcome = self.auth.new_login(license_number, password).await?;
        match &outcome {
            LoginOutcome::SelectionRequired {
                temp_token,
                subject_profile,
                accounts,
            } => {
                self.session
                    .save_pending_selection(temp_token, subject_profile.clone(), accounts.clone())
                    .await;
            }
            LoginOutcome::Authenticated(success) => {
                self.save_authenticated(success.clone()).await;
            }
        }
        Ok(outcome)
    }

    /// Confirm one of the candidate accounts from the pending selection,
    /// converting it into a full session. The pending selection is
    /// discarded immediately after conversion.
    pub async fn confirm_account(
        &self,
        account: &CandidateAccount,
    ) -> Result<Session, AuthError> {
        let pending = self
            .session
            .load_pending_selection()
            .await
            .ok_or(AuthError::NoPendingSelection)?;

        let vendor_id = account.vendor_id_str().ok_or_else(|| {
            AuthError::InvalidResponse("candidate account missing vendor_id".to_string())
        })?;
        let tenant_id = account.tenant_id_str().ok_or_else(|| {
            AuthError::InvalidResponse("candidate account missing tenant_id".to_string())
        })?;

        let success = self
            .auth
            .confirm_login(&pending.temp_token, &vendor_id, &tenant_id)
            .await?;

        let session = self.save_authenticated(success).await;
        self.session.clear_pending_selection().await;
        Ok(session)
    }

    /// Switch to another company account. The returned credential replaces
    /// the session wholesale.
    pub async fn switch_company(
        &self,
        vendor_id: &str,
        tenant_id: &str,
    ) -> Result<Session, AuthError> {
        let current = self
            .session
            .load_session()
            .await
            .ok_or(AuthError::NotAuthenticated)?;
        let success = self
            .auth
            .switch_company(&current.access_token, vendor_id, tenant_id)
            .await?;
        Ok(self.save_authenticated(success).await)
    }

    /// Start the background reporting loop. Fails with a tracking error
    /// when permissions or the session are not ready.
    pub async fn start_tracking(&self) -> Result<(), TrackingError> {
        self.reporter.start().await
    }

    /// Full logout: stop tracking, cancel the expiry timer, clear the
    /// session and any pending selection. Infallible and idempotent.
    pub async fn logout(&self) {
        info!("logging out");
        self.reporter.stop();
        self.session.clear_session().await;
        self.session.clear_pending_selection().await;
    }

    /// App came to the foreground: permissions may have changed while we
    /// were away, and tracking should resume for an authenticated session.
    pub async fn handle_foreground(&self) {
        debug!("app foregrounded");
        self.monitor.notify_resumed();
        if self.session.load_session().await.is_some() {
            if let Err(err) = self.reporter.start().await {
                warn!(code = err.error_code(), "could not resume tracking: {}", err);
            }
        }
    }

    /// App went to the background. Tracking deliberately continues.
    pub fn handle_background(&self) {
        debug!("app backgrounded; tracking continues");
    }

    async fn save_authenticated(&self, success: LoginSuccess) -> Session {
        self.session
            .save_session(&success.access_token, Some(success.profile))
            .await
    }
}
