use std::sync::Arc;

use crate::data::classify::parse_types;
use crate::data::filter::DateRange;
use crate::data::model::{ChannelCatalog, StatsResult};
use crate::data::stats;
use crate::error::Result;
use crate::repository::{DatasetRepository, LoadedDataset};
use crate::store::{ContentStore, StoredBlob};

/// The operations exposed to transport adapters.
///
/// Cheap to share between request handlers behind an `Arc`; all state lives
/// in the store and the dataset cache.
pub struct StatsService {
    store: Arc<ContentStore>,
    repository: DatasetRepository,
}

impl StatsService {
    pub fn new(store: Arc<ContentStore>) -> Self {
        let repository = DatasetRepository::new(Arc::clone(&store));
        Self { store, repository }
    }

    pub fn repository(&self) -> &DatasetRepository {
        &self.repository
    }

    /// Store a Parquet file, skipping the upload when identical bytes are
    /// already present.
    pub fn store_blob(&self, data: &[u8]) -> Result<StoredBlob> {
        self.store.put(data)
    }

    /// Channel ids grouped by type, optionally restricted to `types`.
    pub fn list_channels<S: AsRef<str>>(
        &self,
        content_id: &str,
        types: Option<&[S]>,
    ) -> Result<ChannelCatalog> {
        // Reject bad type names before touching storage.
        let wanted = types.map(|t| parse_types(t)).transpose()?;
        let loaded = self.load(content_id)?;
        Ok(match wanted {
            Some(wanted) if !wanted.is_empty() => loaded.catalog.restrict(&wanted),
            _ => loaded.catalog.clone(),
        })
    }

    /// Mean and standard deviation per channel over an optional date range.
    pub fn compute_stats<S: AsRef<str>>(
        &self,
        content_id: &str,
        channel_ids: Option<&[S]>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<StatsResult> {
        let loaded = self.load(content_id)?;
        let range = DateRange::validate(start, end)?;
        stats::compute(&loaded.dataset, channel_ids, &range)
    }

    /// Like [`StatsService::compute_stats`] with the date range given in
    /// list form (`[start]` or `[start, end]`).
    pub fn compute_stats_in<S: AsRef<str>>(
        &self,
        content_id: &str,
        channel_ids: Option<&[S]>,
        date_range: &[Option<&str>],
    ) -> Result<StatsResult> {
        let loaded = self.load(content_id)?;
        let range = DateRange::from_bounds(date_range)?;
        stats::compute(&loaded.dataset, channel_ids, &range)
    }

    fn load(&self, content_id: &str) -> Result<Arc<LoadedDataset>> {
        self.store.check_id(content_id)?;
        self.repository.load(content_id)
    }
}
