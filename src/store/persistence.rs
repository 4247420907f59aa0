//! Persistence layer for stores
//!
//! Each store lives in one file: a bincode-encoded, versioned envelope around the
//! [`Store`] tree. Writes go to a `.tmp` sibling first and are renamed into place, so a
//! crash mid-write never leaves a half-written store behind.

use crate::error::StorageError;
use crate::store::{Store, StoreBackend};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoreFile {
    format_version: u32,
    store: Store,
}

/// Filesystem backend: one bincode file per store
#[derive(Debug, Clone, Default)]
pub struct FsStoreBackend;

impl FsStoreBackend {
    pub fn new() -> Self {
        Self
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl StoreBackend for FsStoreBackend {
    fn load(&self, path: &Path) -> Result<Store, StorageError> {
        if !path.exists() {
            return Err(StorageError::StoreNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read store {:?}: {}", path, e),
            ))
        })?;
        let file: StoreFile = bincode::deserialize(&bytes).map_err(|e| StorageError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if file.format_version != FORMAT_VERSION {
            return Err(StorageError::Decode {
                path: path.to_path_buf(),
                reason: format!("unsupported format version {}", file.format_version),
            });
        }
        file.store.validate()?;
        trace!(path = %path.display(), "Loaded store");
        Ok(file.store)
    }

    fn save(&self, path: &Path, store: &Store) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::IoError(std::io::Error::new(
                        e.kind(),
                        format!("Failed to create parent directory {:?}: {}", parent, e),
                    ))
                })?;
            }
        }

        let envelope = StoreFile {
            format_version: FORMAT_VERSION,
            store: store.clone(),
        };
        let serialized = bincode::serialize(&envelope).map_err(|e| StorageError::Encode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let temp_path = Self::temp_path(path);
        fs::write(&temp_path, &serialized).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to write store to {:?}: {}", temp_path, e),
            ))
        })?;
        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to rename temp file to {:?}: {}", path, e),
            ))
        })?;
        trace!(path = %path.display(), bytes = serialized.len(), "Saved store");
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), StorageError> {
        fs::remove_file(path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to remove store {:?}: {}", path, e),
            ))
        })
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        fs::rename(from, to).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to rename {:?} to {:?}: {}", from, to, e),
            ))
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
