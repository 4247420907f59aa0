//! Config loader: assembles sources in precedence order and deserializes settings.

use super::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::MergeSettings;
use crate::error::MergeError;
use std::path::Path;
use tracing::debug;

/// Loads [`MergeSettings`] from defaults, files, and the environment
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults < global file < `<workdir>/condmerge.toml` < environment.
    pub fn load(workdir: &Path) -> Result<MergeSettings, MergeError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workdir)?;
        let builder = environment::add_to_builder(builder);
        let settings: MergeSettings = builder.build()?.try_deserialize()?;
        debug!(
            workdir = %workdir.display(),
            parameters = settings.parameters.len(),
            "Loaded configuration"
        );
        Ok(settings)
    }

    /// Defaults < explicit file < environment. The global file is not consulted.
    pub fn load_from_file(path: &Path) -> Result<MergeSettings, MergeError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = workspace_file::add_explicit(builder, path)?;
        let builder = environment::add_to_builder(builder);
        let settings: MergeSettings = builder.build()?.try_deserialize()?;
        debug!(
            config_path = %path.display(),
            parameters = settings.parameters.len(),
            "Loaded configuration file"
        );
        Ok(settings)
    }
}
