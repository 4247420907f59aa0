//! Working-directory config file source: ./condmerge.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

/// Config file looked up in the working directory when no explicit file is given.
pub const WORKDIR_CONFIG_FILE: &str = "condmerge.toml";

/// Add `<workdir>/condmerge.toml` to builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workdir: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = workdir.join(WORKDIR_CONFIG_FILE);
    if !path.is_file() {
        return Ok(builder);
    }
    Ok(builder.add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(false)))
}

/// Add an explicitly named config file. It must exist; any extension is read as TOML.
pub fn add_explicit(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    Ok(builder.add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(true)))
}
