//! Content-addressed blob storage.
//!
//! Blobs are keyed by the hex digest of their raw bytes, so storing the same
//! bytes twice is a no-op the second time. The bytes themselves live in an
//! [`ObjectStore`] backend; [`ObjectStoreBackend`] covers S3-compatible
//! endpoints, a directory tree on disk and a process-local store.

mod backend;

use std::fmt;
use std::sync::Arc;

use md5::Md5;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Result, StatsError};

pub use backend::{ObjectStoreBackend, S3Credentials, S3Settings};

/// Extension appended to content ids to form object keys.
pub const OBJECT_EXTENSION: &str = "parquet";

pub const CONTENT_TYPE: &str = "application/x-parquet";

// ---------------------------------------------------------------------------
// Backend abstraction
// ---------------------------------------------------------------------------

/// Minimal key/value object storage.
///
/// `exists` and `get` must only report absence (`false` / `None`) for a
/// definitive "not found"; any other failure is an error.
pub trait ObjectStore: Send + Sync {
    fn exists(&self, key: &str) -> Result<bool>;

    fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<()>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

// ---------------------------------------------------------------------------
// Content ids
// ---------------------------------------------------------------------------

/// Digest used to derive content ids.
///
/// `Md5` keeps ids compatible with existing deployments (32 hex chars);
/// `Sha256` gives 64 hex chars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum HashPolicy {
    #[default]
    Md5,
    Sha256,
}

impl HashPolicy {
    pub fn digest_hex(self, data: &[u8]) -> String {
        match self {
            HashPolicy::Md5 => hex::encode(Md5::digest(data)),
            HashPolicy::Sha256 => hex::encode(Sha256::digest(data)),
        }
    }

    /// Length of a content id in hex characters.
    pub fn id_len(self) -> usize {
        match self {
            HashPolicy::Md5 => 32,
            HashPolicy::Sha256 => 64,
        }
    }
}

impl fmt::Display for HashPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashPolicy::Md5 => f.write_str("md5"),
            HashPolicy::Sha256 => f.write_str("sha256"),
        }
    }
}

/// Outcome of [`ContentStore::put`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBlob {
    #[serde(rename = "file_id")]
    pub content_id: String,
    /// `true` when this call performed the upload.
    #[serde(rename = "stored")]
    pub created: bool,
}

// ---------------------------------------------------------------------------
// ContentStore
// ---------------------------------------------------------------------------

pub struct ContentStore {
    backend: Arc<dyn ObjectStore>,
    policy: HashPolicy,
}

impl ContentStore {
    pub fn new(backend: Arc<dyn ObjectStore>, policy: HashPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> HashPolicy {
        self.policy
    }

    /// Store `data` unless an object with the same content id exists.
    pub fn put(&self, data: &[u8]) -> Result<StoredBlob> {
        let content_id = self.policy.digest_hex(data);
        let key = object_key(&content_id);

        if self.backend.exists(&key)? {
            log::info!("{key} already stored, skipping upload");
            return Ok(StoredBlob {
                content_id,
                created: false,
            });
        }

        self.backend.put(&key, data, CONTENT_TYPE)?;
        log::info!("stored {key} ({} bytes)", data.len());
        Ok(StoredBlob {
            content_id,
            created: true,
        })
    }

    /// Fetch the bytes of a previously stored blob.
    pub fn get(&self, content_id: &str) -> Result<Vec<u8>> {
        self.check_id(content_id)?;
        self.backend
            .get(&object_key(content_id))?
            .ok_or_else(|| StatsError::not_found(format!("File_id {content_id} is not available")))
    }

    /// Reject ids that could not have come from [`ContentStore::put`].
    pub fn check_id(&self, content_id: &str) -> Result<()> {
        let well_formed = content_id.len() == self.policy.id_len()
            && content_id
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed {
            Ok(())
        } else {
            Err(StatsError::validation(format!(
                "Invalid file_id: {content_id} (expected a lowercase {} hex digest)",
                self.policy
            )))
        }
    }
}

pub fn object_key(content_id: &str) -> String {
    format!("{content_id}.{OBJECT_EXTENSION}")
}
