//! Runtime configuration and wire/storage constants.

use std::time::Duration;

/// Default base URL for the booking backend.
pub const DEFAULT_API_BASE_URL: &str = "https://api.ridebeacon.dev";

/// Default base URL for the realtime location database.
pub const DEFAULT_REALTIME_BASE_URL: &str = "https://realtime.ridebeacon.dev";

/// Backend auth endpoints consumed by the login/session layer.
pub mod endpoints {
    pub const LOGIN: &str = "/api/v1/auth/driver/login";
    pub const NEW_LOGIN: &str = "/api/v1/auth/driver/new/login";
    pub const LOGIN_CONFIRM: &str = "/api/v1/auth/driver/login/confirm";
    pub const SWITCH_COMPANY: &str = "/api/v1/auth/driver/switch-company";
}

/// Logical storage keys. `SESSION` and `PENDING_SELECTION` hold JSON
/// envelopes and are authoritative; the `LEGACY_*` keys are flat mirrors
/// kept for older call sites and are never read back by this crate.
pub mod keys {
    pub const SESSION: &str = "session";
    pub const PENDING_SELECTION: &str = "pending_selection";

    pub const LEGACY_ACCESS_TOKEN: &str = "access_token";
    pub const LEGACY_DRIVER_ID: &str = "driver_id";
    pub const LEGACY_TENANT_ID: &str = "tenant_id";
    pub const LEGACY_VENDOR_ID: &str = "vendor_id";
}

/// How often a running reporter publishes a position.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Upper bound on a single position fix.
pub const POSITION_TIMEOUT: Duration = Duration::from_secs(15);

/// How often the permission monitor re-checks OS grants.
pub const PERMISSION_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Expiry timers never fire sooner than this after arming.
pub const MIN_EXPIRY_DELAY_MS: i64 = 1000;

/// Retries for the login-confirm call on transient failures.
pub const CONFIRM_RETRIES: u32 = 2;

/// Tunable settings for one composed coordinator.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub api_base_url: String,
    pub realtime_base_url: String,
    pub report_interval: Duration,
    pub position_timeout: Duration,
    pub permission_poll_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            realtime_base_url: DEFAULT_REALTIME_BASE_URL.to_string(),
            report_interval: REPORT_INTERVAL,
            position_timeout: POSITION_TIMEOUT,
            permission_poll_interval: PERMISSION_POLL_INTERVAL,
        }
    }
}
