//! JSON import and export of stores, for authoring inputs and inspecting outputs.

use crate::error::StorageError;
use crate::store::Store;
use std::path::Path;

/// Render a store as pretty-printed JSON.
pub fn to_json(store: &Store) -> Result<String, StorageError> {
    serde_json::to_string_pretty(store).map_err(|e| StorageError::Encode {
        path: "<json>".into(),
        reason: e.to_string(),
    })
}

/// Parse and validate a store from JSON text.
pub fn from_json(text: &str) -> Result<Store, StorageError> {
    let store: Store = serde_json::from_str(text).map_err(|e| StorageError::Decode {
        path: "<json>".into(),
        reason: e.to_string(),
    })?;
    store.validate()?;
    Ok(store)
}

/// Read a JSON store document from disk.
pub fn read_json_file(path: &Path) -> Result<Store, StorageError> {
    let text = std::fs::read_to_string(path)?;
    from_json(&text).map_err(|e| match e {
        StorageError::Decode { reason, .. } => StorageError::Decode {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })
}
