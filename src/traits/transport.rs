//! Realtime database transport trait abstraction.
//!
//! Two interchangeable backends publish driver locations: a native-SDK-style
//! primary that may fail to initialize, and a plain HTTP fallback that is
//! always constructible. Both implement this one capability surface so the
//! try-primary-then-fallback policy lives in a single place
//! ([`crate::transport::TransportSelector`]).

use async_trait::async_trait;
use serde_json::Value;

/// Transport operation errors.
#[derive(Debug, Clone)]
pub enum TransportError {
    /// The transport's backing service never initialized. This is the
    /// structured signal that a fallback attempt is warranted.
    Unavailable { message: String },
    /// The endpoint answered with a non-success status.
    Http { status: u16, message: String },
    /// The request never produced a response.
    Network(String),
    /// Payload could not be encoded or the response decoded.
    Serialization(String),
    /// The backend accepted the request but refused the data.
    Rejected(String),
}

impl TransportError {
    /// Whether a publish failure on the primary justifies one fallback
    /// attempt: either the structured unavailable signal, or an error whose
    /// message says the backing service was never initialized.
    pub fn warrants_fallback(&self) -> bool {
        match self {
            TransportError::Unavailable { .. } => true,
            TransportError::Network(msg) | TransportError::Rejected(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("not available") || msg.contains("not initialized")
            }
            _ => false,
        }
    }

    /// Whether the failure is transport-level rather than data-level. Read
    /// and delete calls fall back on these.
    pub fn is_structural(&self) -> bool {
        match self {
            TransportError::Unavailable { .. } | TransportError::Network(_) => true,
            TransportError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::Unavailable { .. } => "E_TRANSPORT_UNAVAILABLE",
            TransportError::Http { .. } => "E_TRANSPORT_HTTP",
            TransportError::Network(_) => "E_TRANSPORT_NET",
            TransportError::Serialization(_) => "E_TRANSPORT_SER",
            TransportError::Rejected(_) => "E_TRANSPORT_REJECTED",
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Unavailable { message } => {
                write!(f, "Transport not available: {}", message)
            }
            TransportError::Http { status, message } => {
                write!(f, "Transport HTTP error ({}): {}", status, message)
            }
            TransportError::Network(msg) => write!(f, "Transport network error: {}", msg),
            TransportError::Serialization(msg) => {
                write!(f, "Transport serialization error: {}", msg)
            }
            TransportError::Rejected(msg) => write!(f, "Transport rejected request: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Trait for one realtime-database backend.
///
/// Paths are slash-joined keys (see [`crate::transport::path`]); values are
/// arbitrary JSON documents.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Stable name for logs and fallback markers.
    fn name(&self) -> &'static str;

    /// Replace the document at `path` with `value`.
    async fn write(&self, path: &str, value: &Value) -> Result<(), TransportError>;

    /// Read the document at `path`. A stored JSON `null` reads as `None`.
    async fn read(&self, path: &str) -> Result<Option<Value>, TransportError>;

    /// Delete the document at `path`. Deleting a missing document succeeds.
    async fn delete(&self, path: &str) -> Result<(), TransportError>;
}
