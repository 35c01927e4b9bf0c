use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use crate::error::{Result, StatsError};
use crate::store::{ContentStore, HashPolicy, ObjectStoreBackend, S3Credentials, S3Settings};

/// Storage backend settings, read from flags or the environment.
///
/// With no endpoint configured objects are kept on local disk under
/// `data_dir/bucket`.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// S3-compatible endpoint URL
    #[arg(long, env = "ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bucket (or directory under --data-dir) holding the files
    #[arg(long, env = "BUCKET", default_value = "channel-stats")]
    pub bucket: String,

    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Root directory for the local backend
    #[arg(long, env = "STATS_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Digest used for content ids
    #[arg(long, env = "STATS_HASH_POLICY", value_enum, default_value_t = HashPolicy::Md5)]
    pub hash_policy: HashPolicy,

    /// Per-request timeout for the S3 backend, in seconds
    #[arg(long, env = "STATS_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Retries for transient S3 failures
    #[arg(long, env = "STATS_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: usize,
}

impl StorageConfig {
    /// Access key pair, if configured. Half a pair is a configuration error.
    pub fn credentials(&self) -> Result<Option<S3Credentials>> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Ok(Some(S3Credentials {
                access_key_id: id.clone(),
                secret_access_key: secret.clone(),
                session_token: self.session_token.clone(),
            })),
            (None, None) => Ok(None),
            _ => Err(StatsError::validation(
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together",
            )),
        }
    }

    pub fn open(&self) -> Result<ContentStore> {
        let backend = match &self.endpoint {
            Some(endpoint) => {
                log::info!("using object storage at {endpoint}, bucket {}", self.bucket);
                ObjectStoreBackend::s3(&S3Settings {
                    endpoint: endpoint.clone(),
                    bucket: self.bucket.clone(),
                    region: self.region.clone(),
                    credentials: self.credentials()?,
                    timeout: Duration::from_secs(self.request_timeout_secs),
                    max_retries: self.max_retries,
                })?
            }
            None => {
                log::info!(
                    "using local storage at {}",
                    self.data_dir.join(&self.bucket).display()
                );
                ObjectStoreBackend::local(&self.data_dir, &self.bucket)?
            }
        };
        Ok(ContentStore::new(Arc::new(backend), self.hash_policy))
    }
}
