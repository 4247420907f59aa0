//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::MergeError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &MergeError) -> String {
    match e {
        MergeError::NoInputs => "No input files found; nothing to merge.".to_string(),
        MergeError::NoParameters => {
            "No parameters configured; add [parameters.<label>] entries to condmerge.toml."
                .to_string()
        }
        other => format!("Error: {}", other),
    }
}
