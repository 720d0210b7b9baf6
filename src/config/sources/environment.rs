//! Environment variable source: LAYOUT__* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const ENV_PREFIX: &str = "LAYOUT";

pub(crate) fn source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

/// Add environment variable overlay to builder.
/// `LAYOUT__MAX_NESTING_DEPTH=8` sets `max_nesting_depth`; `LAYOUT__LOGGING__LEVEL`
/// reaches into the logging table.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(source()))
}
