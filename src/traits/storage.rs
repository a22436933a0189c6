//! Persistent key-value storage trait abstraction.
//!
//! The session layer persists its envelopes through this seam. Production
//! uses the JSON-file adapter in [`crate::adapters::file_storage`]; tests use
//! the in-memory store from [`crate::adapters::mock`].

use async_trait::async_trait;

/// Storage operation errors.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Underlying I/O failed.
    Io(String),
    /// Stored content could not be encoded or decoded.
    Serialization(String),
    /// Other error.
    Other(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "Storage IO error: {}", msg),
            StorageError::Serialization(msg) => write!(f, "Storage serialization error: {}", msg),
            StorageError::Other(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Trait for async, string-keyed, string-valued persistent storage.
///
/// Mirrors the platform storage surface the mobile client uses: flat keys,
/// opaque string values, every call may suspend and fail independently.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
