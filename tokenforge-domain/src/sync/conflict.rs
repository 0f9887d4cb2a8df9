//! Timestamp gate run before every write to a remote.
//!
//! The remote is safe to overwrite when its `updatedAt` is not later than the
//! timestamp recorded at the last sync. Nothing is locked between the check
//! and the write, so two writers can both pass the gate; the later write wins.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::storage::{StorageError, StorageProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No sync has happened yet; nothing to compare against.
    NoBaseline,
    Comparing,
    SafeToWrite,
    RemoteNewer,
}

/// Outcome of one gate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictCheck {
    pub state: SyncState,
    pub remote_updated_at: Option<DateTime<Utc>>,
}

impl ConflictCheck {
    pub fn is_safe(&self) -> bool {
        self.state == SyncState::SafeToWrite
    }
}

/// A remote without a timestamp never blocks a write.
pub fn compare_updated_at(last_synced: DateTime<Utc>, remote: Option<DateTime<Utc>>) -> SyncState {
    match remote {
        Some(remote) if remote > last_synced => SyncState::RemoteNewer,
        _ => SyncState::SafeToWrite,
    }
}

/// Runs the gate against `provider`. A failed retrieve aborts with the
/// storage error, before any write.
pub async fn check_remote(
    provider: &dyn StorageProvider,
    last_synced: Option<DateTime<Utc>>,
) -> Result<ConflictCheck, StorageError> {
    let initial = match last_synced {
        None => SyncState::NoBaseline,
        Some(_) => SyncState::Comparing,
    };
    debug!("Conflict check for {} remote starts in {:?}", provider.provider_type(), initial);

    let (state, remote_updated_at) = match (initial, last_synced) {
        (SyncState::Comparing, Some(last_synced)) => {
            let remote = provider.retrieve().await?;
            let remote_updated_at = remote.as_ref().and_then(|document| document.updated_at());
            (compare_updated_at(last_synced, remote_updated_at), remote_updated_at)
        }
        _ => (SyncState::SafeToWrite, None),
    };

    if state == SyncState::RemoteNewer {
        warn!(
            "Remote was updated at {:?}, after the last sync at {:?}",
            remote_updated_at, last_synced
        );
    } else {
        debug!("Remote is safe to write");
    }
    Ok(ConflictCheck {
        state,
        remote_updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DocumentMetadata, MemoryStorage, NormalizedDocument};
    use chrono::Duration;

    fn document_at(updated_at: Option<DateTime<Utc>>) -> NormalizedDocument {
        NormalizedDocument {
            metadata: DocumentMetadata {
                updated_at,
                version: None,
            },
            ..NormalizedDocument::default()
        }
    }

    #[test]
    fn test_compare_updated_at() {
        let t0 = Utc::now();
        assert_eq!(compare_updated_at(t0, Some(t0)), SyncState::SafeToWrite);
        assert_eq!(compare_updated_at(t0, Some(t0 - Duration::seconds(1))), SyncState::SafeToWrite);
        assert_eq!(compare_updated_at(t0, Some(t0 + Duration::milliseconds(1))), SyncState::RemoteNewer);
        assert_eq!(compare_updated_at(t0, None), SyncState::SafeToWrite);
    }

    #[tokio::test]
    async fn test_check_remote_states() {
        let t0 = Utc::now();
        let newer = MemoryStorage::with_document(document_at(Some(t0 + Duration::seconds(5))));
        let check = check_remote(&newer, Some(t0)).await.unwrap();
        assert_eq!(check.state, SyncState::RemoteNewer);
        assert!(!check.is_safe());

        let untimed = MemoryStorage::with_document(document_at(None));
        assert!(check_remote(&untimed, Some(t0)).await.unwrap().is_safe());

        let empty = MemoryStorage::new();
        assert!(check_remote(&empty, Some(t0)).await.unwrap().is_safe());
        assert!(check_remote(&newer, None).await.unwrap().is_safe());
    }
}
