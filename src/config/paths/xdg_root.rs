//! XDG Base Directory utilities for locating configuration.

use crate::error::SnapshotError;
use std::path::PathBuf;

/// Application directory name under the XDG config home
pub const APP_DIR: &str = "layout-snapshot";

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise defaults to `$HOME/.config`
/// Follows XDG Base Directory Specification
pub fn config_home() -> Result<PathBuf, SnapshotError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        SnapshotError::ConfigError(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;

    Ok(PathBuf::from(home).join(".config"))
}

/// Path of the global config file
///
/// Returns `$XDG_CONFIG_HOME/layout-snapshot/config.toml`; the file need not exist.
pub fn global_config_path() -> Result<PathBuf, SnapshotError> {
    Ok(config_home()?.join(APP_DIR).join("config.toml"))
}
