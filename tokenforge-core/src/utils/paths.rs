//! XDG Base Directory and application-specific path resolution.
//!
//! Built on `directories-next`. Every function returns
//! [`ConfigError::DirectoryUnavailable`] (wrapped in [`CoreError`]) when the
//! directory cannot be determined, e.g. when no HOME is set.

use crate::error::{ConfigError, CoreError};
use directories_next::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "tokenforge";
const APPLICATION: &str = "tokenforge";

fn project_dirs() -> Result<ProjectDirs, CoreError> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or_else(|| {
        CoreError::Config(ConfigError::DirectoryUnavailable {
            dir_type: "Application Project".to_string(),
        })
    })
}

/// `$XDG_CONFIG_HOME` (e.g. `~/.config`).
pub fn get_config_base_dir() -> Result<PathBuf, CoreError> {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            CoreError::Config(ConfigError::DirectoryUnavailable {
                dir_type: "Config Base".to_string(),
            })
        })
}

/// Application config directory, e.g. `~/.config/tokenforge`.
pub fn get_app_config_dir() -> Result<PathBuf, CoreError> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Application data directory, e.g. `~/.local/share/tokenforge`.
///
/// File-backed client storage keeps its records here.
pub fn get_app_data_dir() -> Result<PathBuf, CoreError> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// `$XDG_STATE_HOME` (e.g. `~/.local/state`). Falls back to the local data
/// directory on platforms without an XDG state home.
pub fn get_state_base_dir() -> Result<PathBuf, CoreError> {
    BaseDirs::new()
        .map(|dirs| {
            #[cfg(target_os = "linux")]
            {
                match std::env::var("XDG_STATE_HOME") {
                    Ok(state_home) if !state_home.is_empty() => PathBuf::from(state_home),
                    _ => dirs.home_dir().join(".local/state"),
                }
            }
            #[cfg(not(target_os = "linux"))]
            {
                dirs.data_local_dir().to_path_buf()
            }
        })
        .ok_or_else(|| {
            CoreError::Config(ConfigError::DirectoryUnavailable {
                dir_type: "State Base".to_string(),
            })
        })
}

/// Application state directory, e.g. `~/.local/state/tokenforge`.
///
/// Relative log file paths are resolved against this directory.
pub fn get_app_state_dir() -> Result<PathBuf, CoreError> {
    get_state_base_dir().map(|base| base.join(APPLICATION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_dirs_are_namespaced() {
        // Skipped silently on hosts without a home directory.
        if let Ok(dir) = get_app_config_dir() {
            assert!(dir.to_string_lossy().contains("tokenforge"));
        }
        if let Ok(dir) = get_app_state_dir() {
            assert!(dir.to_string_lossy().contains("tokenforge"));
        }
    }
}
