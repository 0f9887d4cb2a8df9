//! Configuration Management for tokenforge Core.
//!
//! - [`types`]: the configuration schema ([`CoreConfig`], [`LoggingConfig`], [`RemoteConfig`]).
//! - [`defaults`]: default values used by `serde` when a field is missing.
//! - [`loader`]: [`ConfigLoader`], which locates, parses and validates `config.toml`.
//!
//! ## Configuration Loading Process
//!
//! 1. `ConfigLoader::load()` looks for `config.toml` in the application config
//!    directory (see [`crate::utils::paths`]).
//! 2. A missing file yields `CoreConfig::default()`.
//! 3. An existing file is parsed as TOML; unknown fields are rejected.
//! 4. The result is validated: log level and format are normalized, the remote
//!    base URL must parse, the request timeout must be positive, and a relative
//!    log file path is resolved against the state directory.

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{CoreConfig, LoggingConfig, RemoteConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults as config_defaults;
    use std::path::PathBuf;

    #[test]
    fn test_new_core_config_default() {
        let config = CoreConfig::default();
        let default_log_config = LoggingConfig::default();
        assert_eq!(config.logging.level, default_log_config.level);
        assert_eq!(config.logging.file_path, default_log_config.file_path);
        assert_eq!(config.remote.jsonbin_base_url, config_defaults::default_jsonbin_base_url());
    }

    #[test]
    fn test_core_config_deserialize_minimal() {
        let toml_data = r#"
            [logging]
            level = "debug"
        "#;
        let config: CoreConfig = toml::from_str(toml_data).expect("Failed to deserialize CoreConfig");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file_path, config_defaults::default_log_file_path());
        assert_eq!(config.remote.request_timeout_secs, config_defaults::default_request_timeout_secs());
    }

    #[test]
    fn test_core_config_deserialize_full() {
        let toml_data = r#"
            [logging]
            level = "trace"
            file_path = "/var/log/tokenforge.log"
            format = "json"

            [remote]
            jsonbin_base_url = "http://localhost:9000/v3"
            request_timeout_secs = 5
            plugin_version = "53"
        "#;
        let config: CoreConfig = toml::from_str(toml_data).expect("Failed to deserialize CoreConfig");

        assert_eq!(config.logging.file_path, Some(PathBuf::from("/var/log/tokenforge.log")));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.remote.jsonbin_base_url, "http://localhost:9000/v3");
        assert_eq!(config.remote.request_timeout_secs, 5);
        assert_eq!(config.remote.plugin_version, "53");
    }
}
