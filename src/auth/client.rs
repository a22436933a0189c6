//! HTTP client for the backend auth endpoints.
//!
//! Responses arrive as `{success, data, error}` envelopes with the useful
//! fields under `data`. Error bodies vary across backend revisions, so the
//! message extraction probes `detail.message`, `message`, `error` and
//! `detail` in that order before giving up on a generic status line.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{endpoints, CONFIRM_RETRIES};
use crate::session::CandidateAccount;

/// Base backoff for confirm-login retries; doubles per attempt.
const RETRY_BACKOFF_MS: u64 = 300;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Token missing in response")]
    MissingToken,

    #[error("No pending selection to confirm")]
    NoPendingSelection,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Transient failures worth retrying: no response at all, or a 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            AuthError::Network(_) => true,
            AuthError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// A completed authentication: the credential plus the profile blob the
/// backend attached to it.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub access_token: String,
    pub profile: Value,
}

/// Outcome of a first-factor login.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// The backend issued a full credential directly.
    Authenticated(LoginSuccess),
    /// The identity matched several accounts; the caller must confirm one.
    SelectionRequired {
        temp_token: String,
        subject_profile: Option<Value>,
        accounts: Vec<CandidateAccount>,
    },
}

pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Single-factor login with tenant, username and password.
    pub async fn login(
        &self,
        tenant_id: &str,
        username: &str,
        password: &str,
    ) -> Result<LoginSuccess, AuthError> {
        debug!(%tenant_id, %username, "login request");
        let body = self
            .post_json(
                endpoints::LOGIN,
                json!({
                    "tenant_id": tenant_id,
                    "username": username,
                    "password": password,
                }),
                None,
            )
            .await?;

        let data = envelope_data(&body);
        let access_token = data
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or(AuthError::MissingToken)?;

        info!("login succeeded");
        Ok(LoginSuccess {
            access_token: access_token.to_string(),
            profile: data.clone(),
        })
    }

    /// First-factor login by license number. The backend answers with
    /// either a full credential or a temporary token plus candidate
    /// accounts to pick from.
    pub async fn new_login(
        &self,
        license_number: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        debug!(%license_number, "first-factor login request");
        let body = self
            .post_json(
                endpoints::NEW_LOGIN,
                json!({
                    "license_number": license_number,
                    "password": password,
                }),
                None,
            )
            .await?;

        let data = envelope_data(&body);

        let temp_token = data
            .get("temp_token")
            .or_else(|| data.get("token"))
            .and_then(Value::as_str);
        if let Some(temp_token) = temp_token {
            let accounts = data
                .get("accounts")
                .cloned()
                .map(|raw| serde_json::from_value(raw).unwrap_or_default())
                .unwrap_or_default();
            info!("first-factor login succeeded; account selection required");
            return Ok(LoginOutcome::SelectionRequired {
                temp_token: temp_token.to_string(),
                subject_profile: data.get("driver").cloned().filter(|v| !v.is_null()),
                accounts,
            });
        }

        if let Some(access_token) = data.get("access_token").and_then(Value::as_str) {
            info!("first-factor login issued a full credential directly");
            return Ok(LoginOutcome::Authenticated(LoginSuccess {
                access_token: access_token.to_string(),
                profile: data.clone(),
            }));
        }

        Err(AuthError::MissingToken)
    }

    /// Convert a pending selection into a full session. Transient failures
    /// (no response, 5xx) are retried with doubling backoff.
    pub async fn confirm_login(
        &self,
        temp_token: &str,
        vendor_id: &str,
        tenant_id: &str,
    ) -> Result<LoginSuccess, AuthError> {
        let payload = json!({
            "temp_token": temp_token,
            "vendor_id": vendor_id,
            "tenant_id": tenant_id,
        });

        let mut attempt = 0u32;
        loop {
            debug!(attempt, "confirm-login request");
            match self
                .post_json(endpoints::LOGIN_CONFIRM, payload.clone(), None)
                .await
            {
                Ok(body) => {
                    let data = envelope_data(&body);
                    let access_token = data
                        .get("access_token")
                        .or_else(|| data.get("token"))
                        .and_then(Value::as_str)
                        .ok_or(AuthError::MissingToken)?;
                    info!("account confirmed");
                    return Ok(LoginSuccess {
                        access_token: access_token.to_string(),
                        profile: data.clone(),
                    });
                }
                Err(err) => {
                    attempt += 1;
                    if attempt > CONFIRM_RETRIES || !err.is_retryable() {
                        return Err(err);
                    }
                    let backoff = RETRY_BACKOFF_MS * 2u64.pow(attempt - 1);
                    warn!(attempt, backoff_ms = backoff, "confirm-login failed, retrying: {}", err);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
            }
        }
    }

    /// Switch the authenticated driver to another company account. The
    /// response carries a new credential that replaces the session
    /// wholesale.
    pub async fn switch_company(
        &self,
        access_token: &str,
        vendor_id: &str,
        tenant_id: &str,
    ) -> Result<LoginSuccess, AuthError> {
        debug!(%vendor_id, %tenant_id, "switch-company request");
        let body = self
            .post_json(
                endpoints::SWITCH_COMPANY,
                json!({
                    "vendor_id": vendor_id,
                    "tenant_id": tenant_id,
                }),
                Some(access_token),
            )
            .await?;

        let data = envelope_data(&body);
        let access_token = data
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or(AuthError::MissingToken)?;

        info!("company switched");
        Ok(LoginSuccess {
            access_token: access_token.to_string(),
            profile: data.clone(),
        })
    }

    async fn post_json(
        &self,
        endpoint: &str,
        payload: Value,
        bearer: Option<&str>,
    ) -> Result<Value, AuthError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut builder = self.client.post(&url).json(&payload);
        if let Some(token) = bearer {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let response = builder
            .send()
            .await
            .map_err(|err| AuthError::Network(err.to_string()))?;

        let status = response.status().as_u16();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !(200..300).contains(&status) {
            return Err(AuthError::Api {
                status,
                message: extract_error_message(status, &body),
            });
        }
        Ok(body)
    }
}

/// The useful fields of a response envelope live under `data`; tolerate
/// envelopes that skip the wrapper.
fn envelope_data(body: &Value) -> &Value {
    body.get("data").unwrap_or(body)
}

/// Pull a user-presentable message out of an error body, probing the
/// shapes different backend revisions use.
fn extract_error_message(status: u16, body: &Value) -> String {
    if let Some(message) = body
        .get("detail")
        .and_then(|d| d.get("message"))
        .and_then(Value::as_str)
    {
        return message.to_string();
    }
    for key in ["message", "error"] {
        if let Some(message) = body.get(key).and_then(Value::as_str) {
            return message.to_string();
        }
    }
    if let Some(message) = body.get("detail").and_then(Value::as_str) {
        return message.to_string();
    }
    format!("Server error: {}", status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_prefers_nested_detail_message() {
        let body = json!({
            "detail": {"message": "Invalid license number"},
            "message": "outer",
        });
        assert_eq!(extract_error_message(400, &body), "Invalid license number");
    }

    #[test]
    fn test_extract_falls_through_known_keys() {
        assert_eq!(
            extract_error_message(400, &json!({"message": "m"})),
            "m"
        );
        assert_eq!(extract_error_message(400, &json!({"error": "e"})), "e");
        assert_eq!(
            extract_error_message(400, &json!({"detail": "plain detail"})),
            "plain detail"
        );
    }

    #[test]
    fn test_extract_defaults_to_status_line() {
        assert_eq!(
            extract_error_message(503, &Value::Null),
            "Server error: 503"
        );
        assert_eq!(
            extract_error_message(400, &json!({"detail": {"code": 7}})),
            "Server error: 400"
        );
    }

    #[test]
    fn test_envelope_data_unwraps_or_passes_through() {
        let wrapped = json!({"data": {"access_token": "t"}});
        assert_eq!(envelope_data(&wrapped)["access_token"], "t");

        let bare = json!({"access_token": "t"});
        assert_eq!(envelope_data(&bare)["access_token"], "t");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AuthError::Network("timeout".into()).is_retryable());
        assert!(AuthError::Api {
            status: 502,
            message: "bad gateway".into()
        }
        .is_retryable());
        assert!(!AuthError::Api {
            status: 401,
            message: "denied".into()
        }
        .is_retryable());
        assert!(!AuthError::MissingToken.is_retryable());
    }
}
