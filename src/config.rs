//! Configuration System
//!
//! Merge settings are read once per run from TOML files and the environment, validated,
//! and frozen into an immutable [`MergeConfig`] handed to the orchestrator.

use crate::error::MergeError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod facade;
mod merge_policy;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::WORKDIR_CONFIG_FILE;

pub const DEFAULT_WEIGHT_PATH: &str = "RunSummary/Counts";
pub const DEFAULT_OUTPUT_PREFIX: &str = "out";
pub const DEFAULT_EXTENSION: &str = "h5s";

/// One compared parameter: dataset path and relative tolerance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub spread: f64,
}

/// Immutable run configuration passed into the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    pub parameters: Vec<ParameterSpec>,
    /// Dataset whose axis-0 length is a unit's weight
    pub weight_path: String,
    pub output_prefix: String,
    pub extension: String,
}

impl MergeConfig {
    /// Config comparing `parameters`, with default paths and naming.
    pub fn new(parameters: Vec<ParameterSpec>) -> Self {
        Self {
            parameters,
            weight_path: DEFAULT_WEIGHT_PATH.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_weight_path(mut self, weight_path: &str) -> Self {
        self.weight_path = weight_path.to_string();
        self
    }
}

/// Root configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSettings {
    #[serde(default = "default_weight_path")]
    pub weight_path: String,

    /// File name prefix of produced outputs
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// Store file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Compared parameters keyed by a free-form label
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterSpec>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_weight_path() -> String {
    DEFAULT_WEIGHT_PATH.to_string()
}

fn default_output_prefix() -> String {
    DEFAULT_OUTPUT_PREFIX.to_string()
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            weight_path: default_weight_path(),
            output_prefix: default_output_prefix(),
            extension: default_extension(),
            parameters: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Parameter(String, String),
    System(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Parameter(label, msg) => write!(f, "Parameter '{}': {}", label, msg),
            ValidationError::System(msg) => write!(f, "System: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl MergeSettings {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (label, parameter) in &self.parameters {
            if parameter.name.trim().is_empty() {
                errors.push(ValidationError::Parameter(
                    label.clone(),
                    "name cannot be empty".to_string(),
                ));
            }
            if !parameter.spread.is_finite() || parameter.spread < 0.0 {
                errors.push(ValidationError::Parameter(
                    label.clone(),
                    format!("spread must be a finite non-negative number, got {}", parameter.spread),
                ));
            }
        }

        if self.weight_path.trim().is_empty() {
            errors.push(ValidationError::System("weight_path cannot be empty".to_string()));
        }
        if self.output_prefix.is_empty() || self.output_prefix.contains('/') {
            errors.push(ValidationError::System(format!(
                "output_prefix must be a non-empty file name prefix, got '{}'",
                self.output_prefix
            )));
        }
        if self.extension.is_empty() || self.extension.starts_with('.') {
            errors.push(ValidationError::System(format!(
                "extension must be non-empty and given without a dot, got '{}'",
                self.extension
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and freeze into the run configuration.
    pub fn into_merge_config(self) -> Result<MergeConfig, MergeError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            MergeError::Config(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(MergeConfig {
            parameters: self.parameters.into_values().collect(),
            weight_path: self.weight_path,
            output_prefix: self.output_prefix,
            extension: self.extension,
        })
    }

    /// Render as TOML, as it would appear in a config file.
    pub fn to_toml(&self) -> Result<String, MergeError> {
        toml::to_string_pretty(self).map_err(|e| MergeError::Config(e.to_string()))
    }
}
