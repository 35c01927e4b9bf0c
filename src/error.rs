use thiserror::Error;

/// Caller-facing classification of a [`StatsError`].
///
/// Adapters map these onto their own transport codes (HTTP status, exit
/// code, ...). Parse failures report as [`ErrorKind::Io`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Io,
}

/// Every failure the core can produce.
///
/// Errors carry rendered messages rather than source errors so they can be
/// cloned and handed to every waiter of a shared dataset load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// Malformed or contradictory input.
    #[error("{0}")]
    Validation(String),
    /// A content id or channel id that does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Storage backend unreachable or a write failed.
    #[error("storage error: {0}")]
    Io(String),
    /// Retrieved content is not a readable dataset.
    #[error("failed to parse dataset: {0}")]
    Parse(String),
}

impl StatsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StatsError::Validation(_) => ErrorKind::Validation,
            StatsError::NotFound(_) => ErrorKind::NotFound,
            StatsError::Io(_) | StatsError::Parse(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        StatsError::Validation(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        StatsError::NotFound(msg.into())
    }
}

impl From<std::io::Error> for StatsError {
    fn from(value: std::io::Error) -> Self {
        StatsError::Io(value.to_string())
    }
}

impl From<object_store::Error> for StatsError {
    fn from(value: object_store::Error) -> Self {
        StatsError::Io(value.to_string())
    }
}

impl From<parquet::errors::ParquetError> for StatsError {
    fn from(value: parquet::errors::ParquetError) -> Self {
        StatsError::Parse(value.to_string())
    }
}

impl From<arrow::error::ArrowError> for StatsError {
    fn from(value: arrow::error::ArrowError) -> Self {
        StatsError::Parse(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
