/// Data layer: core types, loading, classification, and statistics.
///
/// Architecture:
/// ```text
///  {content_id}.parquet bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode → Dataset (timestamp index + channels)
///   └──────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │ classify  │          │  filter   │  validate date range → row span
///   └──────────┘          └──────────┘
///   ChannelCatalog              │
///                               ▼
///                         ┌──────────┐
///                         │  stats    │  mean / std per channel
///                         └──────────┘
/// ```

pub mod classify;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
