//! Push, pull and remote provisioning for a shared [`TokenStore`].

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokenforge_core::config::RemoteConfig;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::conflict::{check_remote, SyncState};
use super::errors::SyncError;
use crate::messages::{HostMessage, MessageChannel};
use crate::storage::{
    provider_for, MemoryStorage, NormalizedDocument, StorageCredentials, StorageError, StorageProvider,
    StorageProviderType,
};
use crate::store::TokenStore;

/// Builds a provider for a set of credentials.
pub type ProviderFactory =
    Arc<dyn Fn(&StorageCredentials) -> Result<Arc<dyn StorageProvider>, StorageError> + Send + Sync>;

const EMPTY_REMOTE_MESSAGE: &str = "No tokens stored on remote";

/// Moves documents between the store and storage providers.
///
/// The store lock is never held across provider I/O. Every failure is
/// reported to the host as a notify message and returned to the caller.
pub struct TokenSyncService {
    store: Arc<RwLock<TokenStore>>,
    channel: Arc<dyn MessageChannel>,
    config: RemoteConfig,
    provider_factory: ProviderFactory,
}

impl TokenSyncService {
    pub fn new(store: Arc<RwLock<TokenStore>>, channel: Arc<dyn MessageChannel>, config: RemoteConfig) -> Self {
        let factory_config = config.clone();
        let local: Arc<dyn StorageProvider> = Arc::new(MemoryStorage::new());
        let provider_factory: ProviderFactory = Arc::new(
            move |credentials: &StorageCredentials| -> Result<Arc<dyn StorageProvider>, StorageError> {
                match credentials.provider {
                    StorageProviderType::Local => Ok(Arc::clone(&local)),
                    _ => provider_for(credentials, &factory_config),
                }
            },
        );
        Self {
            store,
            channel,
            config,
            provider_factory,
        }
    }

    pub fn with_provider_factory(mut self, provider_factory: ProviderFactory) -> Self {
        self.provider_factory = provider_factory;
        self
    }

    /// The provider for `credentials`. Every local connection shares one
    /// document.
    pub fn provider(&self, credentials: &StorageCredentials) -> Result<Arc<dyn StorageProvider>, StorageError> {
        (self.provider_factory)(credentials)
    }

    pub fn store(&self) -> Arc<RwLock<TokenStore>> {
        Arc::clone(&self.store)
    }

    fn report<T>(&self, operation: &str, result: &Result<T, SyncError>) {
        if let Err(e) = result {
            match e {
                SyncError::RemoteNewer { .. } => warn!("{} aborted: {}", operation, e),
                _ => error!("{} failed: {}", operation, e),
            }
            self.channel.notify_error(&e.to_string());
        }
    }

    /// Writes the store's document after the conflict gate allows it.
    pub async fn push(&self, provider: &dyn StorageProvider) -> Result<(), SyncError> {
        let baseline = self.store.read().await.last_synced_updated_at();
        let result = self.push_with_baseline(provider, baseline).await;
        self.report("Push", &result);
        result
    }

    async fn push_with_baseline(
        &self,
        provider: &dyn StorageProvider,
        baseline: Option<DateTime<Utc>>,
    ) -> Result<(), SyncError> {
        if provider.is_read_only() {
            return Err(StorageError::Unsupported {
                provider: provider.provider_type(),
                operation: "save",
            }
            .into());
        }

        let check = check_remote(provider, baseline).await?;
        if check.state == SyncState::RemoteNewer {
            return Err(SyncError::RemoteNewer {
                remote: check.remote_updated_at.unwrap_or_else(Utc::now),
                last_synced: baseline,
            });
        }

        let document = self.store.read().await.to_document(&self.config.plugin_version);
        provider.save(&document).await?;

        let snapshot = NormalizedDocument::snapshot(&document.tokens, &document.themes);
        self.store
            .write()
            .await
            .set_last_synced_state(snapshot, document.updated_at());
        info!(
            "Pushed {} token sets to {} remote",
            document.tokens.len(),
            provider.provider_type()
        );
        Ok(())
    }

    /// Replaces the store's document with the remote one. Returns `false`
    /// and leaves the store untouched when the remote holds no token sets.
    pub async fn pull(&self, provider: &dyn StorageProvider) -> Result<bool, SyncError> {
        let result = self.try_pull(provider).await;
        self.report("Pull", &result);
        result
    }

    async fn try_pull(&self, provider: &dyn StorageProvider) -> Result<bool, SyncError> {
        let document = match provider.retrieve().await? {
            Some(document) if !document.tokens.is_empty() => document,
            _ => {
                info!("{} remote holds no token sets", provider.provider_type());
                self.channel.notify_info(EMPTY_REMOTE_MESSAGE);
                return Ok(false);
            }
        };

        let updated_at = document.updated_at();
        let set_count = document.tokens.len();
        let mut store = self.store.write().await;
        store.load_document(document, provider.is_read_only())?;
        store.mark_synced(updated_at);
        info!(
            "Pulled {} token sets from {} remote",
            set_count,
            provider.provider_type()
        );
        Ok(true)
    }

    /// Connects to an existing remote: pulls its document and hands the
    /// credentials to the host.
    pub async fn add_credentials(&self, credentials: StorageCredentials) -> Result<bool, SyncError> {
        let result = self.try_add_credentials(&credentials).await;
        self.report("Adding credentials", &result);
        if result.is_ok() {
            self.channel.send(HostMessage::Credentials(credentials));
        }
        result
    }

    async fn try_add_credentials(&self, credentials: &StorageCredentials) -> Result<bool, SyncError> {
        credentials.validate()?;
        let provider = self.provider(credentials)?;
        self.try_pull(provider.as_ref()).await
    }

    /// Provisions a new remote, writes the current document to it and returns
    /// the completed credentials.
    pub async fn create_remote(&self, credentials: StorageCredentials) -> Result<StorageCredentials, SyncError> {
        let result = self.try_create_remote(credentials).await;
        self.report("Creating remote", &result);
        if let Ok(created) = &result {
            self.channel.send(HostMessage::Credentials(created.clone()));
        }
        result
    }

    async fn try_create_remote(&self, credentials: StorageCredentials) -> Result<StorageCredentials, SyncError> {
        if credentials.name.trim().is_empty() {
            return Err(SyncError::Validation("a name is required to create a remote".to_string()));
        }
        let provisioner = self.provider(&credentials)?;
        let updated_at = self.store.read().await.updated_at();
        let id = provisioner
            .create(&credentials.name, updated_at, &credentials.secret)
            .await?
            .ok_or_else(|| {
                SyncError::Validation(format!(
                    "{} storage cannot create remotes",
                    credentials.provider
                ))
            })?;
        info!("Created {} remote '{}' ({})", credentials.provider, credentials.name, id);

        let created = StorageCredentials { id, ..credentials };
        let provider = self.provider(&created)?;
        self.push_with_baseline(provider.as_ref(), None).await?;
        Ok(created)
    }
}
