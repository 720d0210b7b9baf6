//! Configuration
//!
//! Layered settings for the snapshot engine: built-in defaults, an optional global
//! file under the XDG config home, an optional explicit file, then `LAYOUT__*`
//! environment variables.

pub mod facade;
pub(crate) mod merge;
pub mod paths;
pub(crate) mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Default bound on archive nesting and emission recursion
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Deflate level used for archives rebuilt inside a folder tree
pub const DEFAULT_FOLDER_COMPRESSION_LEVEL: u32 = 9;

/// Level used for a top-level `.zip`/`.jar` target; 0 means stored
pub const DEFAULT_ARCHIVE_COMPRESSION_LEVEL: u32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    #[serde(default = "default_folder_compression_level")]
    pub folder_compression_level: u32,

    #[serde(default = "default_archive_compression_level")]
    pub archive_compression_level: u32,

    /// Apply remappers when the target is a single archive
    #[serde(default)]
    pub remap_archive_targets: bool,

    /// Apply remappers when the target is a directory tree
    #[serde(default = "default_true")]
    pub remap_folder_targets: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_NESTING_DEPTH
}

fn default_folder_compression_level() -> u32 {
    DEFAULT_FOLDER_COMPRESSION_LEVEL
}

fn default_archive_compression_level() -> u32 {
    DEFAULT_ARCHIVE_COMPRESSION_LEVEL
}

fn default_true() -> bool {
    true
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            folder_compression_level: DEFAULT_FOLDER_COMPRESSION_LEVEL,
            archive_compression_level: DEFAULT_ARCHIVE_COMPRESSION_LEVEL,
            remap_archive_targets: false,
            remap_folder_targets: true,
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SnapshotConfig::default();
        assert_eq!(config.max_nesting_depth, 64);
        assert_eq!(config.folder_compression_level, 9);
        assert_eq!(config.archive_compression_level, 0);
        assert!(!config.remap_archive_targets);
        assert!(config.remap_folder_targets);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: SnapshotConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "max_nesting_depth = 8\n[logging]\nlevel = \"debug\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.max_nesting_depth, 8);
        assert_eq!(config.folder_compression_level, 9);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "text");
    }
}
