//! Default configuration values for tokenforge Core.
//!
//! Referenced from `#[serde(default = "...")]` attributes in [`super::types`].

use super::types::{LoggingConfig, RemoteConfig};
use std::path::PathBuf;

pub fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file_path: default_log_file_path(),
        format: default_log_format(),
    }
}

pub fn default_log_level() -> String {
    "info".to_string()
}

/// No log file by default.
pub fn default_log_file_path() -> Option<PathBuf> {
    None
}

pub fn default_log_format() -> String {
    "text".to_string()
}

pub fn default_remote_config() -> RemoteConfig {
    RemoteConfig {
        jsonbin_base_url: default_jsonbin_base_url(),
        request_timeout_secs: default_request_timeout_secs(),
        plugin_version: default_plugin_version(),
    }
}

pub fn default_jsonbin_base_url() -> String {
    "https://api.jsonbin.io/v3".to_string()
}

pub fn default_request_timeout_secs() -> u64 {
    30
}

/// Version string written into `metadata.version` of every pushed document.
pub fn default_plugin_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
