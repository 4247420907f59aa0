//! Input discovery: the run files in a directory, in a stable order.

use crate::error::{MergeError, StorageError};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Store files directly inside `dir` with the given extension, sorted by path.
///
/// Files whose name starts with `output_prefix` are left out so that a rerun over the
/// same directory does not pick up a previous run's outputs.
pub fn discover_inputs(dir: &Path, extension: &str, output_prefix: &str) -> Result<Vec<PathBuf>, MergeError> {
    if !dir.is_dir() {
        return Err(StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input directory not found: {}", dir.display()),
        ))
        .into());
    }

    let mut inputs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to read {}: {}", dir.display(), e),
            ))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let is_output = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |name| name.starts_with(output_prefix));
        if is_output {
            debug!(path = %path.display(), "Skipping previous output");
            continue;
        }
        inputs.push(dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()));
    }

    inputs.sort();
    if inputs.is_empty() {
        return Err(MergeError::NoInputs);
    }
    debug!(dir = %dir.display(), count = inputs.len(), "Discovered inputs");
    Ok(inputs)
}

/// Comparable identity of a store path, whether or not the file exists yet.
///
/// `.` components are dropped and the parent directory is canonicalized when it exists,
/// so `./out1.h5s`, `out1.h5s` and its absolute spelling all compare equal.
pub fn path_identity(path: &Path) -> PathBuf {
    let lexical: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let Some(name) = lexical.file_name() else {
        return lexical;
    };
    let parent = match lexical.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match dunce::canonicalize(parent) {
        Ok(dir) => dir.join(name),
        Err(_) => lexical,
    }
}

/// Drop repeated paths, keeping the first occurrence and the original order.
pub fn dedup_inputs(inputs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = std::collections::BTreeSet::new();
    inputs
        .into_iter()
        .filter(|path| seen.insert(path_identity(path)))
        .collect()
}
