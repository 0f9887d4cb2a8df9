//! Configuration Loading for tokenforge Core.
//!
//! [`ConfigLoader`] locates `config.toml`, deserializes it and validates the
//! result. A missing file is not an error: the default configuration is used.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::CoreConfig;
use crate::error::{ConfigError, CoreError};
use crate::utils::paths::{get_app_config_dir, get_app_state_dir};

const CONFIG_FILE_NAME: &str = "config.toml";
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Namespace for the static configuration loading functions.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `config.toml` from the application config directory and validates it.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DirectoryUnavailable`] if the XDG directories cannot be determined.
    /// - [`ConfigError::ReadError`] for read failures other than "not found".
    /// - [`ConfigError::ParseError`] for invalid TOML or unknown fields.
    /// - [`ConfigError::ValidationError`] for out-of-range values.
    pub fn load() -> Result<CoreConfig, CoreError> {
        let config_path = get_app_config_dir()?.join(CONFIG_FILE_NAME);
        let state_dir = get_app_state_dir()?;
        Self::load_from_path_with_state_dir(&config_path, &state_dir)
    }

    /// Loads and validates the configuration at `path`, resolving relative log
    /// paths against the application state directory.
    pub fn load_from_path(path: &Path) -> Result<CoreConfig, CoreError> {
        let state_dir = get_app_state_dir()?;
        Self::load_from_path_with_state_dir(path, &state_dir)
    }

    fn load_from_path_with_state_dir(path: &Path, state_dir: &Path) -> Result<CoreConfig, CoreError> {
        let config = match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => CoreConfig::default(),
            Ok(content) => Self::parse(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No configuration file at {:?}, using defaults", path);
                CoreConfig::default()
            }
            Err(e) => {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                }
                .into())
            }
        };
        Self::validate_config(config, state_dir)
    }

    /// Parses and validates a TOML string. Relative log paths are left untouched.
    pub fn load_from_str(content: &str) -> Result<CoreConfig, CoreError> {
        let config = Self::parse(content)?;
        Self::validate_config(config, Path::new(""))
    }

    fn parse(content: &str) -> Result<CoreConfig, CoreError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e).into())
    }

    /// Normalizes and checks a parsed configuration.
    ///
    /// Log level and format are lower-cased and must be one of the known values.
    /// The JSONBin base URL must be an absolute http(s) URL and the request
    /// timeout must be non-zero. A relative `logging.file_path` is joined onto
    /// `state_dir` (unless `state_dir` is empty).
    pub fn validate_config(mut config: CoreConfig, state_dir: &Path) -> Result<CoreConfig, CoreError> {
        let level = config.logging.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Expected one of {:?}",
                config.logging.level, VALID_LOG_LEVELS
            ))
            .into());
        }
        config.logging.level = level;

        let format = config.logging.format.to_lowercase();
        if !VALID_LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log format '{}'. Expected one of {:?}",
                config.logging.format, VALID_LOG_FORMATS
            ))
            .into());
        }
        config.logging.format = format;

        if let Some(file_path) = &config.logging.file_path {
            if file_path.is_relative() && !state_dir.as_os_str().is_empty() {
                config.logging.file_path = Some(state_dir.join(file_path));
            }
        }

        let base_url = url::Url::parse(&config.remote.jsonbin_base_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "Invalid remote.jsonbin_base_url '{}': {}",
                config.remote.jsonbin_base_url, e
            ))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "remote.jsonbin_base_url must use http or https, got '{}'",
                base_url.scheme()
            ))
            .into());
        }
        config.remote.jsonbin_base_url = config.remote.jsonbin_base_url.trim_end_matches('/').to_string();

        if config.remote.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "remote.request_timeout_secs must be greater than zero".to_string(),
            )
            .into());
        }

        Ok(config)
    }

    /// Every location `load()` would consult, for diagnostics.
    pub fn candidate_paths() -> Result<Vec<PathBuf>, CoreError> {
        Ok(vec![get_app_config_dir()?.join(CONFIG_FILE_NAME)])
    }
}
