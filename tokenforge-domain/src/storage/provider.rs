//! The storage provider contract and credential handling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokenforge_core::config::RemoteConfig;

use super::document::NormalizedDocument;
use super::errors::StorageError;
use super::jsonbin::JsonBinStorage;
use super::url::UrlStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageProviderType {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "jsonbin")]
    JsonBin,
    #[serde(rename = "url")]
    Url,
}

impl StorageProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageProviderType::Local => "local",
            StorageProviderType::JsonBin => "jsonbin",
            StorageProviderType::Url => "url",
        }
    }
}

impl fmt::Display for StorageProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection details for one remote.
///
/// `id` is the bin id for JSONBin and the endpoint URL for the URL provider.
/// `secret` is the master key (JSONBin) or request headers (URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageCredentials {
    pub provider: StorageProviderType,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
}

impl StorageCredentials {
    pub fn new(provider: StorageProviderType, id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            provider,
            id: id.into(),
            secret: secret.into(),
            name: String::new(),
            internal_id: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Checks the fields required to read from this remote.
    pub fn validate(&self) -> Result<(), StorageError> {
        match self.provider {
            StorageProviderType::Local => Ok(()),
            StorageProviderType::JsonBin if self.id.trim().is_empty() || self.secret.trim().is_empty() => Err(
                StorageError::MissingCredentials("JSONBin requires both an id and a secret".to_string()),
            ),
            StorageProviderType::Url if self.id.trim().is_empty() => {
                Err(StorageError::MissingCredentials("URL provider requires an endpoint URL".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// A backend that stores the whole token document.
///
/// Multi-set writes are best-effort: callers must not assume atomicity across
/// token sets for backends that store each set as a separate resource.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    fn provider_type(&self) -> StorageProviderType;

    /// Read-only providers cannot `save`; documents pulled from them are
    /// marked as not editable.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Fetches the remote document. `Ok(None)` means the remote exists but
    /// holds no document yet.
    async fn retrieve(&self) -> Result<Option<NormalizedDocument>, StorageError>;

    async fn save(&self, document: &NormalizedDocument) -> Result<(), StorageError>;

    /// Provisions a new remote resource and returns its id. Backends without
    /// provisioning return `Ok(None)`.
    async fn create(
        &self,
        _name: &str,
        _updated_at: DateTime<Utc>,
        _secret: &str,
    ) -> Result<Option<String>, StorageError> {
        Ok(None)
    }
}

/// Builds the provider described by `credentials`.
///
/// JSONBin credentials without an id are accepted so that a new bin can be
/// created; `retrieve` and `save` on such a provider fail with
/// [`StorageError::MissingCredentials`].
///
/// Local storage is one in-process document shared by every connection, so
/// it is not built here; `TokenSyncService` owns it. Local credentials fail
/// with [`StorageError::Unsupported`].
pub fn provider_for(
    credentials: &StorageCredentials,
    config: &RemoteConfig,
) -> Result<Arc<dyn StorageProvider>, StorageError> {
    match credentials.provider {
        StorageProviderType::Local => Err(StorageError::Unsupported {
            provider: StorageProviderType::Local,
            operation: "connect",
        }),
        StorageProviderType::JsonBin => {
            if credentials.secret.trim().is_empty() {
                return Err(StorageError::MissingCredentials("JSONBin requires a secret".to_string()));
            }
            Ok(Arc::new(JsonBinStorage::new(config, &credentials.id, &credentials.secret)?))
        }
        StorageProviderType::Url => {
            credentials.validate()?;
            Ok(Arc::new(UrlStorage::new(config, &credentials.id, &credentials.secret)?))
        }
    }
}
