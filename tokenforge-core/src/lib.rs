//! # tokenforge Core Library (`tokenforge-core`)
//!
//! `tokenforge-core` is the foundation layer of the tokenforge workspace. The
//! token engine in `tokenforge-domain` builds on it for:
//!
//! - **Error Handling**: the `CoreError` enum and its specific error types
//!   `ConfigError` and `LoggingError`.
//! - **Configuration Management**: TOML configuration loaded through
//!   `ConfigLoader` into a `CoreConfig` (logging and remote storage settings).
//! - **Logging**: a `tracing` subscriber setup with console and optional
//!   rolling-file output in text or JSON format.
//! - **Utility Functions**: XDG path resolution and filesystem helpers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tokenforge_core::config::ConfigLoader;
//! use tokenforge_core::logging::initialize_logging;
//! use tokenforge_core::error::CoreError;
//!
//! fn main() -> Result<(), CoreError> {
//!     let core_config = ConfigLoader::load()?;
//!     initialize_logging(&core_config.logging, false)?;
//!     tracing::info!("tokenforge core initialized");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod utils;

pub use config::{ConfigLoader, CoreConfig, LoggingConfig, RemoteConfig};
pub use error::{ConfigError, CoreError, LoggingError};
pub use logging::{init_minimal_logging, initialize_logging};
pub use utils::{ensure_dir_exists, read_file_to_string, write_string_to_file};
