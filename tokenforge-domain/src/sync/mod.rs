//! Remote synchronization.
//!
//! [`conflict`] holds the optimistic timestamp gate; [`service`] drives
//! push, pull and remote creation for a shared store.

pub mod conflict;
pub mod errors;
pub mod service;

pub use conflict::{check_remote, compare_updated_at, ConflictCheck, SyncState};
pub use errors::{SyncError, SyncErrorKind};
pub use service::{ProviderFactory, TokenSyncService};
