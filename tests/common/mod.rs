#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use channel_stats::data::loader::encode_parquet;
use channel_stats::data::model::{Channel, Dataset};
use channel_stats::store::{ContentStore, HashPolicy, ObjectStore, ObjectStoreBackend};
use channel_stats::{Result, StatsError};

pub const CHANNELS: [&str; 15] = [
    "vel58.3",
    "std58.3",
    "std58.3_detrend",
    "temp56.8",
    "hum56.8",
    "press56.8",
    "dir56.3",
    "sdir56.3",
    "vel47.5",
    "std47.5",
    "std47.5_detrend",
    "vel32",
    "std32",
    "std32_detrend",
    "temp10",
];

pub fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// One row per day of 2019 for every channel in [`CHANNELS`]. Values follow
/// the day of year so window statistics are easy to reason about; every
/// tenth day is missing.
pub fn year_2019() -> Dataset {
    let start = midnight(2019, 1, 1);
    let timestamps: Vec<NaiveDateTime> = (0..365).map(|d| start + chrono::Duration::days(d)).collect();
    let channels = CHANNELS
        .iter()
        .enumerate()
        .map(|(offset, name)| {
            let values = (0..365)
                .map(|d| (d % 10 != 9).then(|| d as f64 + offset as f64))
                .collect();
            Channel::new(*name, values)
        })
        .collect();
    Dataset::new(timestamps, channels).unwrap()
}

pub fn year_2019_parquet() -> Vec<u8> {
    encode_parquet(&year_2019()).unwrap()
}

/// Backend wrapper that counts reads and can slow them down.
pub struct CountingStore {
    pub inner: ObjectStoreBackend,
    pub gets: AtomicUsize,
    pub delay: Duration,
}

impl CountingStore {
    pub fn slow(delay: Duration) -> Self {
        Self {
            inner: ObjectStoreBackend::in_memory().unwrap(),
            gets: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

impl ObjectStore for CountingStore {
    fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key)
    }

    fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        self.inner.put(key, data, content_type)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.inner.get(key)
    }
}

pub fn counting_store(delay: Duration) -> (Arc<CountingStore>, Arc<ContentStore>) {
    let backend = Arc::new(CountingStore::slow(delay));
    let store = Arc::new(ContentStore::new(backend.clone(), HashPolicy::Md5));
    (backend, store)
}

/// Backend whose existence check fails the way an unreachable or
/// misconfigured bucket does. Counts attempted writes.
#[derive(Default)]
pub struct UnreachableStore {
    pub puts: AtomicUsize,
}

impl UnreachableStore {
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl ObjectStore for UnreachableStore {
    fn exists(&self, key: &str) -> Result<bool> {
        Err(StatsError::Io(format!("HEAD {key}: 403 Forbidden")))
    }

    fn put(&self, _key: &str, _data: &[u8], _content_type: &str) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Err(StatsError::Io(format!("GET {key}: 403 Forbidden")))
    }
}
