//! Native-SDK-style primary transport.
//!
//! Unlike the REST fallback, this transport carries initialization state:
//! construction probes the realtime endpoint and, when the probe fails,
//! the transport stays usable but reports every operation as
//! [`TransportError::Unavailable`] - the structured signal that sends the
//! selector to the fallback. This mirrors how an embedded vendor SDK
//! behaves when its backing service never came up.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::rest::{convert_error, status_error};
use crate::traits::{RealtimeTransport, TransportError};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct NativeTransport {
    base_url: String,
    /// Present only when initialization succeeded.
    client: Option<reqwest::Client>,
    init_error: Option<String>,
}

impl NativeTransport {
    /// Initialize against the realtime endpoint. A failed probe is not an
    /// error: the transport is returned uninitialized and the selector
    /// will route around it.
    pub async fn initialize(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        match Self::connect(&base_url).await {
            Ok(client) => {
                debug!(%base_url, "native realtime transport initialized");
                Self {
                    base_url,
                    client: Some(client),
                    init_error: None,
                }
            }
            Err(message) => {
                warn!(
                    "native realtime transport initialization failed (HTTP fallback will be used): {}",
                    message
                );
                Self {
                    base_url,
                    client: None,
                    init_error: Some(message),
                }
            }
        }
    }

    /// An uninitialized instance, for hosts that know the native service
    /// is absent and for tests.
    pub fn unavailable(base_url: impl Into<String>, reason: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: None,
            init_error: Some(reason.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    async fn connect(base_url: &str) -> Result<reqwest::Client, String> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|err| err.to_string())?;
        let probe = format!("{}/.json?shallow=true", base_url);
        let response = client
            .get(&probe)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        if !response.status().is_success() {
            return Err(format!("probe returned status {}", response.status()));
        }
        Ok(client)
    }

    fn require_client(&self) -> Result<&reqwest::Client, TransportError> {
        self.client.as_ref().ok_or_else(|| TransportError::Unavailable {
            message: format!(
                "native realtime client not available: {}",
                self.init_error.as_deref().unwrap_or("service uninitialized")
            ),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }
}

#[async_trait]
impl RealtimeTransport for NativeTransport {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), TransportError> {
        let client = self.require_client()?;
        let response = client
            .put(self.url(path))
            .json(value)
            .send()
            .await
            .map_err(convert_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, TransportError> {
        let client = self.require_client()?;
        let response = client
            .get(self.url(path))
            .send()
            .await
            .map_err(convert_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let value: Value = response
            .json()
            .await
            .map_err(|err| TransportError::Serialization(err.to_string()))?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn delete(&self, path: &str) -> Result<(), TransportError> {
        let client = self.require_client()?;
        let response = client
            .delete(self.url(path))
            .send()
            .await
            .map_err(convert_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }
}
