//! In-process cache of decoded datasets keyed by content id.
//!
//! Loading a dataset (fetch + Parquet decode + classification) is the only
//! expensive step in serving a request, so each content id is loaded at most
//! once at a time: the first caller performs the load while concurrent
//! callers for the same id block on the same slot and receive its outcome.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::data::classify::classify;
use crate::data::loader::decode_parquet;
use crate::data::model::{ChannelCatalog, Dataset};
use crate::error::Result;
use crate::store::ContentStore;

/// A decoded dataset together with its channel catalog.
#[derive(Debug)]
pub struct LoadedDataset {
    pub content_id: String,
    pub dataset: Dataset,
    pub catalog: ChannelCatalog,
}

type Slot = Arc<OnceLock<Result<Arc<LoadedDataset>>>>;

pub struct DatasetRepository {
    store: Arc<ContentStore>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl DatasetRepository {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self {
            store,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the dataset for `content_id`, loading it on first use.
    ///
    /// Failed loads are handed to every caller waiting on them and then
    /// forgotten, so the next call retries.
    pub fn load(&self, content_id: &str) -> Result<Arc<LoadedDataset>> {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(content_id.to_string()).or_default())
        };

        if let Some(Ok(loaded)) = slot.get() {
            log::debug!("dataset {content_id} served from cache");
            return Ok(Arc::clone(loaded));
        }

        match slot.get_or_init(|| self.fetch(content_id)) {
            Ok(loaded) => Ok(Arc::clone(loaded)),
            Err(err) => {
                self.forget(content_id, &slot);
                Err(err.clone())
            }
        }
    }

    /// Drop any cached copy and load again from the store.
    pub fn reload(&self, content_id: &str) -> Result<Arc<LoadedDataset>> {
        self.evict(content_id);
        self.load(content_id)
    }

    /// Drop the cached copy. Requests already holding it keep their `Arc`.
    pub fn evict(&self, content_id: &str) -> bool {
        self.slots.lock().remove(content_id).is_some()
    }

    pub fn is_cached(&self, content_id: &str) -> bool {
        self.slots
            .lock()
            .get(content_id)
            .is_some_and(|slot| matches!(slot.get(), Some(Ok(_))))
    }

    fn fetch(&self, content_id: &str) -> Result<Arc<LoadedDataset>> {
        log::info!("loading dataset {content_id}");
        let bytes = self.store.get(content_id)?;
        let dataset = decode_parquet(Bytes::from(bytes))?;
        let catalog = classify(&dataset);
        log::info!(
            "loaded dataset {content_id}: {} rows, {} channels",
            dataset.len(),
            dataset.channels().len()
        );
        Ok(Arc::new(LoadedDataset {
            content_id: content_id.to_string(),
            dataset,
            catalog,
        }))
    }

    /// Remove a failed slot unless it has already been replaced.
    fn forget(&self, content_id: &str, failed: &Slot) {
        let mut slots = self.slots.lock();
        if slots.get(content_id).is_some_and(|s| Arc::ptr_eq(s, failed)) {
            log::warn!("loading dataset {content_id} failed; will retry on next request");
            slots.remove(content_id);
        }
    }
}
