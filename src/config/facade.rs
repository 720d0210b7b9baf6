//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::SnapshotConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from defaults, the global file, an optional explicit file,
    /// and the environment.
    pub fn load(file: Option<&Path>) -> Result<SnapshotConfig, ConfigError> {
        MergeService::load(file)
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<SnapshotConfig, ConfigError> {
        MergeService::load_from_file(path)
    }

    /// Create default configuration.
    pub fn default() -> SnapshotConfig {
        SnapshotConfig::default()
    }
}
