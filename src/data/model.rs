use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{Result, StatsError};

// ---------------------------------------------------------------------------
// Channel – one numeric column of the dataset
// ---------------------------------------------------------------------------

/// A single named numeric time series. `None` marks a missing sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Channel {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            // NaN is how pandas spells "missing".
            values: values
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Timestamp-indexed table of channels, rows sorted ascending by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    timestamps: Vec<NaiveDateTime>,
    channels: Vec<Channel>,
    /// Column name -> position in `channels`.
    by_name: HashMap<String, usize>,
}

impl Dataset {
    /// Build a dataset, sorting rows by timestamp when the source is unsorted.
    ///
    /// Every channel must have exactly one value per timestamp and channel
    /// names must be unique.
    pub fn new(timestamps: Vec<NaiveDateTime>, channels: Vec<Channel>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(channels.len());
        for (i, ch) in channels.iter().enumerate() {
            if ch.values.len() != timestamps.len() {
                return Err(StatsError::Parse(format!(
                    "column '{}' has {} values but the index has {} rows",
                    ch.name,
                    ch.values.len(),
                    timestamps.len()
                )));
            }
            if by_name.insert(ch.name.clone(), i).is_some() {
                return Err(StatsError::Parse(format!("duplicate column '{}'", ch.name)));
            }
        }

        if timestamps.windows(2).all(|w| w[0] <= w[1]) {
            return Ok(Self {
                timestamps,
                channels,
                by_name,
            });
        }

        let mut order: Vec<usize> = (0..timestamps.len()).collect();
        order.sort_by_key(|&i| timestamps[i]);
        let timestamps = order.iter().map(|&i| timestamps[i]).collect();
        let channels = channels
            .into_iter()
            .map(|ch| Channel {
                values: order.iter().map(|&i| ch.values[i]).collect(),
                name: ch.name,
            })
            .collect();
        Ok(Self {
            timestamps,
            channels,
            by_name,
        })
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Column names in file order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.name.as_str())
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.by_name.get(name).map(|&i| &self.channels[i])
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ChannelType – semantic grouping of channels
// ---------------------------------------------------------------------------

/// Semantic channel types. Declaration order is the order catalogs are
/// reported in; classification priority lives in [`super::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Vel,
    Std,
    StdDtr,
    Temp,
    Hum,
    Press,
    Dir,
    Sdir,
}

impl ChannelType {
    pub const ALL: [ChannelType; 8] = [
        ChannelType::Vel,
        ChannelType::Std,
        ChannelType::StdDtr,
        ChannelType::Temp,
        ChannelType::Hum,
        ChannelType::Press,
        ChannelType::Dir,
        ChannelType::Sdir,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelType::Vel => "vel",
            ChannelType::Std => "std",
            ChannelType::StdDtr => "std_dtr",
            ChannelType::Temp => "temp",
            ChannelType::Hum => "hum",
            ChannelType::Press => "press",
            ChannelType::Dir => "dir",
            ChannelType::Sdir => "sdir",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        ChannelType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| StatsError::validation(format!("Requested invalid channel type: {s}")))
    }
}

// ---------------------------------------------------------------------------
// ChannelCatalog – channel type → member channel ids
// ---------------------------------------------------------------------------

/// Partition of a dataset's recognised columns by [`ChannelType`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChannelCatalog(BTreeMap<ChannelType, Vec<String>>);

impl ChannelCatalog {
    pub(crate) fn from_map(map: BTreeMap<ChannelType, Vec<String>>) -> Self {
        Self(map)
    }

    pub fn get(&self, channel_type: ChannelType) -> Option<&[String]> {
        self.0.get(&channel_type).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelType, &[String])> {
        self.0.iter().map(|(t, cols)| (*t, cols.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keep only the requested types. Every requested type appears in the
    /// result, with an empty list when the dataset has none of it.
    pub fn restrict(&self, types: &[ChannelType]) -> ChannelCatalog {
        ChannelCatalog(
            types
                .iter()
                .map(|t| (*t, self.0.get(t).cloned().unwrap_or_default()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Mean and sample standard deviation of one channel; `None` when there was
/// not enough data in the selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ChannelStats {
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

/// Per-channel statistics keyed by channel id.
pub type StatsResult = BTreeMap<String, ChannelStats>;
