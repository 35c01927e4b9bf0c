//! Sensor channel statistics over content-addressed Parquet files.
//!
//! Files are uploaded once into a [`store::ContentStore`] and referred to by
//! the hex digest of their bytes. A [`service::StatsService`] lists the
//! channels of a file grouped by [`data::model::ChannelType`] and computes
//! mean / standard deviation per channel over an optional date range.

pub mod config;
pub mod data;
pub mod error;
pub mod repository;
pub mod service;
pub mod store;

pub use error::{ErrorKind, Result, StatsError};
pub use service::StatsService;
