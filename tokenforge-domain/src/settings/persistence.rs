//! Key-value client storage backing the UI settings.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokenforge_core::utils::{fs, paths};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::errors::SettingsError;

const CLIENT_STORAGE_FILENAME: &str = "client-storage.json";

#[async_trait]
pub trait ClientStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError>;
}

#[derive(Debug, Default)]
pub struct InMemoryClientStorage {
    entries: RwLock<HashMap<String, Value>>,
}

impl InMemoryClientStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStorage for InMemoryClientStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// All keys in one JSON object on disk.
#[derive(Debug)]
pub struct FileClientStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileClientStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `client-storage.json` in the application data directory.
    pub fn in_data_dir() -> Result<Self, SettingsError> {
        let dir = paths::get_app_data_dir().map_err(|e| {
            SettingsError::persistence_error_from_core(
                "locate_client_storage",
                "Could not determine the data directory".to_string(),
                e,
            )
        })?;
        Ok(Self::new(dir.join(CLIENT_STORAGE_FILENAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, SettingsError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_file_to_string(&self.path).map_err(|e| {
            SettingsError::persistence_error_from_core(
                "read_client_storage",
                format!("Failed to read {:?}", self.path),
                e,
            )
        })?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&content) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) => Err(SettingsError::NotAnObject {
                key: CLIENT_STORAGE_FILENAME.to_string(),
            }),
            Err(source) => Err(SettingsError::DeserializationError {
                key: CLIENT_STORAGE_FILENAME.to_string(),
                source,
            }),
        }
    }
}

#[async_trait]
impl ClientStorage for FileClientStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.read_entries()?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value);
        let content = serde_json::to_string_pretty(&entries).map_err(|source| SettingsError::SerializationError {
            key: key.to_string(),
            source,
        })?;
        fs::write_string_to_file(&self.path, &content).map_err(|e| {
            SettingsError::persistence_error_from_core(
                "write_client_storage",
                format!("Failed to write key '{}' to {:?}", key, self.path),
                e,
            )
        })?;
        debug!("Stored client key '{}' in {:?}", key, self.path);
        Ok(())
    }
}
