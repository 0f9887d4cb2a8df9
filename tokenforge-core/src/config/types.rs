//! Configuration Data Structures for tokenforge Core.
//!
//! These structs are deserialized from `config.toml`. Missing fields take their
//! values from [`super::defaults`]; unknown fields are rejected via
//! `#[serde(deny_unknown_fields)]`.

use super::defaults;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration settings for the logging subsystem.
///
/// ```
/// use tokenforge_core::config::LoggingConfig;
///
/// let log_config = LoggingConfig::default();
/// assert_eq!(log_config.level, "info");
/// assert_eq!(log_config.file_path, None);
/// assert_eq!(log_config.format, "text");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level: "trace", "debug", "info", "warn" or "error" (case-insensitive).
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional log file. Relative paths are resolved against the state directory.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        defaults::default_logging_config()
    }
}

/// Settings shared by the remote storage providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Base URL of the JSONBin v3 API. Overridable for self-hosted mirrors and tests.
    #[serde(default = "defaults::default_jsonbin_base_url")]
    pub jsonbin_base_url: String,
    /// Per-request timeout applied to every provider HTTP call.
    #[serde(default = "defaults::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Written to `metadata.version` of pushed documents.
    #[serde(default = "defaults::default_plugin_version")]
    pub plugin_version: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        defaults::default_remote_config()
    }
}

/// Root configuration structure.
///
/// ```
/// use tokenforge_core::config::CoreConfig;
///
/// let loaded: CoreConfig = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
/// assert_eq!(loaded.logging.level, "warn");
/// assert_eq!(loaded.remote.request_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,
    #[serde(default = "defaults::default_remote_config")]
    pub remote: RemoteConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            logging: defaults::default_logging_config(),
            remote: defaults::default_remote_config(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_deserialize_empty() {
        let config: LoggingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoggingConfig::default());
    }

    #[test]
    fn test_remote_config_deserialize_partial() {
        let config: RemoteConfig = serde_json::from_str(r#"{"request_timeout_secs": 3}"#).unwrap();
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.jsonbin_base_url, defaults::default_jsonbin_base_url());
    }

    #[test]
    fn test_logging_config_rejects_unknown_field() {
        let result = serde_json::from_str::<LoggingConfig>(r#"{"level": "info", "colour": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_core_config_rejects_unknown_section() {
        let result = toml::from_str::<CoreConfig>("[metrics]\nenabled = true\n");
        assert!(result.is_err());
    }
}
