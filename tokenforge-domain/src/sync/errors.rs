use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::storage::StorageError;
use crate::store::StoreError;

/// Error categories surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    Validation,
    Conflict,
    Network,
    NotFound,
    Auth,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Remote tokens were updated at {remote}, after the last sync; pull before pushing")]
    RemoteNewer {
        remote: DateTime<Utc>,
        last_synced: Option<DateTime<Utc>>,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            SyncError::RemoteNewer { .. } => SyncErrorKind::Conflict,
            SyncError::Validation(_) | SyncError::Store(_) => SyncErrorKind::Validation,
            SyncError::Storage(e) => match e {
                StorageError::NotFound { .. } => SyncErrorKind::NotFound,
                StorageError::Auth { .. } => SyncErrorKind::Auth,
                StorageError::Network(_) => SyncErrorKind::Network,
                StorageError::MalformedRemote(_)
                | StorageError::MissingCredentials(_)
                | StorageError::Unsupported { .. } => SyncErrorKind::Validation,
            },
        }
    }
}
