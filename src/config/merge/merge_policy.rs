//! Built-in defaults seeded into every builder, lowest precedence.

use crate::config::{
    DEFAULT_ARCHIVE_COMPRESSION_LEVEL, DEFAULT_FOLDER_COMPRESSION_LEVEL,
    DEFAULT_MAX_NESTING_DEPTH,
};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("max_nesting_depth", DEFAULT_MAX_NESTING_DEPTH as i64)?
        .set_default(
            "folder_compression_level",
            DEFAULT_FOLDER_COMPRESSION_LEVEL as i64,
        )?
        .set_default(
            "archive_compression_level",
            DEFAULT_ARCHIVE_COMPRESSION_LEVEL as i64,
        )?
        .set_default("remap_archive_targets", false)?
        .set_default("remap_folder_targets", true)
}
