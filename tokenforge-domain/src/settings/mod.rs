//! UI settings and their client-side persistence.

pub mod errors;
pub mod persistence;
pub mod service;
pub mod types;

pub use errors::SettingsError;
pub use persistence::{ClientStorage, FileClientStorage, InMemoryClientStorage};
pub use service::{UiSettingsService, UI_SETTINGS_KEY};
pub use types::{UiSettings, UpdateMode};
