//! Storage providers.
//!
//! Every backend implements [`StorageProvider`] (`retrieve`, `save`,
//! `create`) over the same [`NormalizedDocument`]:
//!
//! - [`JsonBinStorage`]: a JSONBin bin, readable and writable.
//! - [`UrlStorage`]: a static JSON endpoint, read-only.
//! - [`MemoryStorage`]: an in-process document.
//!
//! [`provider_for`] builds the backend described by [`StorageCredentials`].

pub mod document;
pub mod errors;
pub mod jsonbin;
pub mod memory;
pub mod provider;
pub mod url;

pub use document::{DocumentFile, DocumentMetadata, NormalizedDocument, THEMES_FILE};
pub use errors::StorageError;
pub use jsonbin::JsonBinStorage;
pub use memory::MemoryStorage;
pub use provider::{provider_for, StorageCredentials, StorageProvider, StorageProviderType};
pub use url::UrlStorage;
