//! # tokenforge domain layer (`tokenforge-domain`)
//!
//! The design-token engine:
//!
//! - [`tokens`]: the token model, the alias resolver and the set merger.
//! - [`store`]: [`TokenStore`], the in-memory document with its edit operations.
//! - [`storage`]: storage providers (JSONBin, static URL, in-memory).
//! - [`sync`]: the timestamp conflict gate and [`TokenSyncService`].
//! - [`messages`]: outbound host messages and the intents built from the store.
//! - [`settings`]: UI settings persisted in client storage.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokenforge_domain::{QueuedMessageChannel, TokenStore, TokenSyncService};
//!
//! let (channel, receiver) = QueuedMessageChannel::unbounded();
//! let store = Arc::new(tokio::sync::RwLock::new(TokenStore::new()));
//! let sync = TokenSyncService::new(store, Arc::new(channel), config.remote.clone());
//! ```

pub use tokenforge_core as core;

pub mod error;
pub mod messages;
pub mod settings;
pub mod storage;
pub mod store;
pub mod sync;
pub mod tokens;

pub use error::{DomainError, DomainResult};
pub use messages::{HostMessage, MessageChannel, QueuedMessageChannel};
pub use settings::{ClientStorage, UiSettings, UiSettingsService};
pub use storage::{provider_for, NormalizedDocument, StorageCredentials, StorageProvider, StorageProviderType};
pub use store::{StoreError, TokenData, TokenStore};
pub use sync::{SyncError, SyncState, TokenSyncService};
pub use tokens::{
    merge, resolve, MergeInput, MergedTokens, ResolvedToken, ResolvedValue, Theme, ThemeId, Token, TokenSet,
    TokenSetStatus, TokenType, TokenValue,
};
