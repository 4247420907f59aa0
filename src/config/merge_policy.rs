//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("weight_path", super::DEFAULT_WEIGHT_PATH)?
        .set_default("output_prefix", super::DEFAULT_OUTPUT_PREFIX)?
        .set_default("extension", super::DEFAULT_EXTENSION)
}
