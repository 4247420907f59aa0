//! In-memory store backend, used for dry runs and tests.

use crate::error::StorageError;
use crate::store::{Store, StoreBackend};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Backend keeping every store in a map keyed by path
#[derive(Debug, Default)]
pub struct MemoryStoreBackend {
    stores: RwLock<BTreeMap<PathBuf, Store>>,
}

impl MemoryStoreBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the given stores out of another backend.
    pub fn preload(source: &dyn StoreBackend, paths: &[PathBuf]) -> Result<Self, StorageError> {
        let backend = Self::new();
        for path in paths {
            let store = source.load(path)?;
            backend.stores.write().insert(path.clone(), store);
        }
        Ok(backend)
    }

    /// Paths of all stores currently held.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.stores.read().keys().cloned().collect()
    }
}

impl StoreBackend for MemoryStoreBackend {
    fn load(&self, path: &Path) -> Result<Store, StorageError> {
        self.stores
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::StoreNotFound(path.to_path_buf()))
    }

    fn save(&self, path: &Path, store: &Store) -> Result<(), StorageError> {
        self.stores.write().insert(path.to_path_buf(), store.clone());
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), StorageError> {
        self.stores
            .write()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::StoreNotFound(path.to_path_buf()))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        let mut stores = self.stores.write();
        let store = stores
            .remove(from)
            .ok_or_else(|| StorageError::StoreNotFound(from.to_path_buf()))?;
        stores.insert(to.to_path_buf(), store);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.stores.read().contains_key(path)
    }
}
