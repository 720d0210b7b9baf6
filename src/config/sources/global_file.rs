//! Global config file source: `$XDG_CONFIG_HOME/layout-snapshot/config.toml`

use crate::config::paths::xdg_root;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};

/// Add the global config file when a config home can be determined; the file is optional.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg_root::global_config_path() {
        Ok(path) => Ok(builder.add_source(File::from(path).required(false))),
        Err(_) => Ok(builder),
    }
}
