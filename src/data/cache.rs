use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use once_cell::sync::Lazy;

use super::loader;
use super::model::RetailDataset;

/// Process-wide dataset cache used by the binaries.
pub static DATASET_CACHE: Lazy<DatasetCache> = Lazy::new(DatasetCache::new);

struct Cached {
    source: PathBuf,
    dataset: Arc<RetailDataset>,
}

/// Holds the most recently loaded dataset until it is explicitly cleared.
///
/// Requests for the same path reuse the loaded rows; a different path
/// replaces them. A failed load leaves the cache empty.
pub struct DatasetCache {
    slot: RwLock<Option<Cached>>,
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetCache {
    pub fn new() -> Self {
        DatasetCache {
            slot: RwLock::new(None),
        }
    }

    /// Return the cached dataset for `path`, loading it from disk on a miss.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<RetailDataset>> {
        self.get_or_load_with(path, loader::load_file)
    }

    /// Same as [`get_or_load`](Self::get_or_load) with a custom loader.
    pub fn get_or_load_with<F>(&self, path: &Path, load: F) -> Result<Arc<RetailDataset>>
    where
        F: FnOnce(&Path) -> Result<RetailDataset>,
    {
        if let Some(hit) = self.lookup(path) {
            return Ok(hit);
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have filled the slot while we waited.
        if let Some(cached) = slot.as_ref().filter(|c| c.source == path) {
            return Ok(Arc::clone(&cached.dataset));
        }

        *slot = None;
        let dataset = Arc::new(load(path)?);
        log::debug!("Cached dataset from {}", path.display());
        *slot = Some(Cached {
            source: path.to_path_buf(),
            dataset: Arc::clone(&dataset),
        });
        Ok(dataset)
    }

    /// The currently cached dataset, if any.
    pub fn cached(&self) -> Option<Arc<RetailDataset>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|c| Arc::clone(&c.dataset))
    }

    /// Drop the cached dataset; the next request reloads.
    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            log::debug!("Dataset cache cleared");
        }
    }

    fn lookup(&self, path: &Path) -> Option<Arc<RetailDataset>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|c| c.source == path)
            .map(|c| Arc::clone(&c.dataset))
    }
}
