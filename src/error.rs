//! Error types for the condmerge merge engine.

use std::path::PathBuf;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store not found: {0}")]
    StoreNotFound(PathBuf),

    #[error("Node is not a group: {0}")]
    NotAGroup(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid dataset shape: {0}")]
    InvalidShape(String),

    #[error("Dataset is not growable: {0}")]
    NotGrowable(String),

    #[error("Failed to encode store {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("Failed to decode store {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised while clustering and merging units
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Schema mismatch at {path}: {reason}")]
    SchemaMismatch { path: String, reason: String },

    #[error("Unit {unit} has no dataset at weight path {path}")]
    MissingWeightPath { unit: String, path: String },

    #[error("Unit {unit} is missing configured parameter {name}")]
    MissingParameter { unit: String, name: String },

    #[error("No input files found")]
    NoInputs,

    #[error("No parameters configured, nothing will be merged")]
    NoParameters,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid active unit mutation: {0}")]
    InvalidMutation(String),

    #[error(
        "Provenance conservation violated: {outputs} from outputs + {raw} raw != {total} inputs"
    )]
    ConservationViolated { outputs: u64, raw: u64, total: u64 },
}

impl MergeError {
    /// Shorthand for a schema mismatch at `path`.
    pub fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        MergeError::SchemaMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a clean "nothing to do" condition rather than a failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, MergeError::NoInputs | MergeError::NoParameters)
    }
}

impl From<config::ConfigError> for MergeError {
    fn from(err: config::ConfigError) -> Self {
        MergeError::Config(err.to_string())
    }
}
