//! In-process storage, used for local documents and in tests.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::document::NormalizedDocument;
use super::errors::StorageError;
use super::provider::{StorageProvider, StorageProviderType};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: RwLock<Option<NormalizedDocument>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: NormalizedDocument) -> Self {
        Self {
            document: RwLock::new(Some(document)),
        }
    }

    /// The currently stored document.
    pub async fn snapshot(&self) -> Option<NormalizedDocument> {
        self.document.read().await.clone()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorage {
    fn provider_type(&self) -> StorageProviderType {
        StorageProviderType::Local
    }

    async fn retrieve(&self) -> Result<Option<NormalizedDocument>, StorageError> {
        Ok(self.document.read().await.clone())
    }

    async fn save(&self, document: &NormalizedDocument) -> Result<(), StorageError> {
        debug!("Storing document with {} token sets in memory", document.tokens.len());
        *self.document.write().await = Some(document.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_save_then_retrieve_returns_equivalent_document() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.retrieve().await.unwrap(), None);

        let document = NormalizedDocument::from_json(json!({
            "tokens": {"global": {"sizing.xs": {"type": "sizing", "value": 4}}},
            "themes": [{"id": "t", "name": "T", "selectedTokenSets": {"global": "enabled"}}],
            "metadata": {"updatedAt": "2024-03-01T10:00:00Z", "version": "1"}
        }))
        .unwrap();
        storage.save(&document).await.unwrap();

        assert_eq!(storage.retrieve().await.unwrap(), Some(document.clone()));
        assert_eq!(storage.snapshot().await, Some(document));
    }

    #[tokio::test]
    async fn test_create_is_not_supported_locally() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.create("x", chrono::Utc::now(), "s").await.unwrap(), None);
    }
}
