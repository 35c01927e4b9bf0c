//! [`ObjectStore`] backends provided by the `object_store` crate.
//!
//! `object_store` is async; every call here is driven to completion on a
//! small runtime owned by the backend so the rest of the crate stays
//! synchronous.

use std::fmt;
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::Duration;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, ClientOptions, DynObjectStore, PutOptions, PutPayload, RetryConfig,
};
use tokio::runtime::{Builder, Runtime};

use super::ObjectStore;
use crate::error::{Result, StatsError};

/// Static access key pair, optionally with a session token.
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Connection settings for an S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    /// Requests are sent unsigned when absent.
    pub credentials: Option<S3Credentials>,
    pub timeout: Duration,
    pub max_retries: usize,
}

/// Blocking adapter over an `object_store` implementation.
#[derive(Debug)]
pub struct ObjectStoreBackend {
    store: Arc<DynObjectStore>,
    runtime: Runtime,
    /// Whether the store keeps object attributes such as the content type.
    attributes: bool,
}

impl ObjectStoreBackend {
    /// S3-compatible endpoint with path-style addressing
    /// (`{endpoint}/{bucket}/{key}`), so MinIO and friends work too.
    pub fn s3(settings: &S3Settings) -> Result<Self> {
        let client = ClientOptions::new()
            .with_timeout(settings.timeout)
            .with_allow_http(true);
        let retry = RetryConfig {
            max_retries: settings.max_retries,
            ..RetryConfig::default()
        };

        let mut builder = AmazonS3Builder::new()
            .with_endpoint(&settings.endpoint)
            .with_bucket_name(&settings.bucket)
            .with_region(&settings.region)
            .with_virtual_hosted_style_request(false)
            .with_client_options(client)
            .with_retry(retry);
        builder = match &settings.credentials {
            Some(creds) => {
                let builder = builder
                    .with_access_key_id(&creds.access_key_id)
                    .with_secret_access_key(&creds.secret_access_key);
                match &creds.session_token {
                    Some(token) => builder.with_token(token),
                    None => builder,
                }
            }
            None => builder.with_skip_signature(true),
        };

        let store = builder.build().map_err(|e| {
            StatsError::validation(format!("Invalid object storage settings: {e}"))
        })?;
        Self::with_store(Arc::new(store), true)
    }

    /// Objects stored as files under `{root}/{bucket}/{key}`.
    ///
    /// Writes land in a staging file that is renamed into place, so readers
    /// never observe a partial object.
    pub fn local(root: impl AsRef<FsPath>, bucket: &str) -> Result<Self> {
        let dir = root.as_ref().join(bucket);
        std::fs::create_dir_all(&dir)
            .map_err(|e| StatsError::Io(format!("creating {}: {e}", dir.display())))?;
        let store = LocalFileSystem::new_with_prefix(&dir)?;
        // Plain files carry no attributes.
        Self::with_store(Arc::new(store), false)
    }

    /// Process-local store, for tests and dry runs.
    pub fn in_memory() -> Result<Self> {
        Self::with_store(Arc::new(InMemory::new()), true)
    }

    fn with_store(store: Arc<DynObjectStore>, attributes: bool) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("object-store")
            .enable_all()
            .build()?;
        Ok(Self {
            store,
            runtime,
            attributes,
        })
    }
}

impl ObjectStore for ObjectStoreBackend {
    fn exists(&self, key: &str) -> Result<bool> {
        let path = Path::from(key);
        match self.runtime.block_on(self.store.head(&path)) {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        let path = Path::from(key);
        let mut opts = PutOptions::default();
        if self.attributes {
            let mut attributes = Attributes::new();
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
            opts.attributes = attributes;
        }
        let payload = PutPayload::from(data.to_vec());
        self.runtime
            .block_on(self.store.put_opts(&path, payload, opts))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = Path::from(key);
        let fetched = self
            .runtime
            .block_on(async { self.store.get(&path).await?.bytes().await });
        match fetched {
            Ok(bytes) => Ok(Some(bytes.to_vec())),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
