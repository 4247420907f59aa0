//! CLI route: single route table and run context. Dispatches to the cluster and store layers.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_merge_report_json, format_merge_report_text, format_show_text};
use crate::cluster::Orchestrator;
use crate::config::{ConfigLoader, MergeSettings};
use crate::discovery::{dedup_inputs, discover_inputs};
use crate::error::MergeError;
use crate::store::{json, FsStoreBackend, MemoryStoreBackend, Store, StoreBackend};
use crate::tree;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Runtime context for CLI execution: loaded settings and the file backend.
pub struct RunContext {
    settings: MergeSettings,
    backend: FsStoreBackend,
}

impl RunContext {
    /// Create run context from the working directory and optional config path. Uses ConfigLoader only.
    pub fn new(workdir: PathBuf, config_path: Option<PathBuf>) -> Result<Self, MergeError> {
        let settings = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workdir)?
        };
        Ok(Self::with_settings(settings))
    }

    pub fn with_settings(settings: MergeSettings) -> Self {
        Self {
            settings,
            backend: FsStoreBackend::new(),
        }
    }

    pub fn settings(&self) -> &MergeSettings {
        &self.settings
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, MergeError> {
        match command {
            Commands::Merge {
                inputs,
                input_dir,
                output_dir,
                dry_run,
                format,
            } => self.handle_merge(inputs, input_dir, output_dir, *dry_run, *format),
            Commands::Show { file } => {
                let store = self.backend.load(file)?;
                format_show_text(file, &store)
            }
            Commands::Dump { file } => {
                let store = self.backend.load(file)?;
                Ok(json::to_json(&store)?)
            }
            Commands::Import { json: source, out } => {
                let store = json::read_json_file(source)?;
                self.backend.save(out, &store)?;
                info!(source = %source.display(), out = %out.display(), "Imported store");
                Ok(format!("Wrote {}", out.display()))
            }
            Commands::Copy { file, out } => {
                let source = self.backend.load(file)?;
                let mut copy = Store::new();
                let stats = tree::merge(&source, 0, &mut copy, 0)?;
                self.backend.save(out, &copy)?;
                info!(
                    source = %file.display(),
                    out = %out.display(),
                    datasets = stats.datasets_created,
                    "Copied store"
                );
                Ok(format!("Wrote {}", out.display()))
            }
            Commands::Config => self.settings.to_toml(),
        }
    }

    fn handle_merge(
        &self,
        inputs: &[PathBuf],
        input_dir: &Path,
        output_dir: &Path,
        dry_run: bool,
        format: OutputFormat,
    ) -> Result<String, MergeError> {
        let config = self.settings.clone().into_merge_config()?;
        if config.parameters.is_empty() {
            return Err(MergeError::NoParameters);
        }

        let inputs = if inputs.is_empty() {
            discover_inputs(input_dir, &config.extension, &config.output_prefix)?
        } else {
            dedup_inputs(inputs.to_vec())
        };
        debug!(inputs = inputs.len(), dry_run, "Resolved merge inputs");

        let report = if dry_run {
            let memory = MemoryStoreBackend::preload(&self.backend, &inputs)?;
            Orchestrator::new(config, &memory, output_dir).run(&inputs)?
        } else {
            std::fs::create_dir_all(output_dir).map_err(crate::error::StorageError::from)?;
            Orchestrator::new(config, &self.backend, output_dir).run(&inputs)?
        };

        match format {
            OutputFormat::Json => format_merge_report_json(&report),
            OutputFormat::Text => Ok(format_merge_report_text(&report, dry_run)),
        }
    }
}
