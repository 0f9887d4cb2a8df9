//! Error module for the tokenforge domain layer.
//!
//! Each module owns a `thiserror` enum; [`DomainError`] aggregates them for
//! callers that drive several modules at once.

use thiserror::Error;
use tokenforge_core::CoreError;

use crate::settings::SettingsError;
use crate::storage::StorageError;
use crate::store::StoreError;
use crate::sync::SyncError;
use crate::tokens::ResolutionError;

/// A general Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Only produced when a caller asks for a resolved value explicitly;
    /// merging keeps failures on the token.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}
