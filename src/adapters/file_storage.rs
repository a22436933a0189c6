//! JSON-file key-value storage adapter.
//!
//! Stores all keys in one JSON object at `~/.ridebeacon/storage.json`.
//! Writes go through a temp file and rename, so a crash mid-write leaves
//! the previous content intact. Loads are tolerant: a missing or
//! unparsable file reads as empty.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::traits::{KeyValueStore, StorageError};

/// The storage directory name under the home directory.
const STORAGE_DIR: &str = ".ridebeacon";

/// The storage file name.
const STORAGE_FILE: &str = "storage.json";

pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write sequences.
    write_guard: Mutex<()>,
}

impl FileStore {
    /// Create a store at the default location.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn new() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self::with_path(home.join(STORAGE_DIR).join(STORAGE_FILE)))
    }

    /// Create a store backed by an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn read_map(&self) -> HashMap<String, String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                debug!("storage file unparsable, starting empty: {}", err);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }

    async fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::Io(err.to_string()))?;
        }
        let json = serde_json::to_string_pretty(map)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|err| StorageError::Io(err.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|err| StorageError::Io(err.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_guard.lock().await;
        let mut map = self.read_map().await;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_guard.lock().await;
        let mut map = self.read_map().await;
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.write_map(&map).await
    }
}
