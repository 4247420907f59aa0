//! Node path utilities
//!
//! Store nodes are addressed by slash-separated paths rooted at `/`.

use crate::error::StorageError;

/// Split a node path into its segments. The root path yields no segments.
pub fn split_path(path: &str) -> Result<Vec<&str>, StorageError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for segment in &segments {
        if *segment == "." || *segment == ".." {
            return Err(StorageError::InvalidPath(format!(
                "relative segment '{}' in {}",
                segment, path
            )));
        }
    }
    Ok(segments)
}

/// Child path of `parent` named `name`.
pub fn join(parent: &str, name: &str) -> String {
    if parent == "/" || parent.is_empty() {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}
