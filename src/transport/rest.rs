//! Plain-HTTP fallback transport.
//!
//! Speaks the realtime database's REST dialect: documents live at
//! `{base}/{path}.json` and respond to PUT/GET/DELETE. Always
//! constructible - there is no initialization that can fail, which is what
//! makes it a safe fallback for the native transport.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::traits::{RealtimeTransport, TransportError};

pub struct RestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl RestTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        debug!(%base_url, "REST realtime transport ready");
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }
}

/// Convert a reqwest failure into a transport error.
pub(crate) fn convert_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Network(format!("request timed out: {}", err))
    } else if err.is_connect() {
        TransportError::Network(format!("connection failed: {}", err))
    } else {
        TransportError::Network(err.to_string())
    }
}

/// Map a non-success response into a transport error, consuming the body
/// for the message.
pub(crate) async fn status_error(response: reqwest::Response) -> TransportError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    TransportError::Http { status, message }
}

#[async_trait]
impl RealtimeTransport for RestTransport {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), TransportError> {
        let response = self
            .client
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
        let response = self
            .client
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
        let response = self
            .client
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
