use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{ChannelCatalog, ChannelType, Dataset};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Pattern table
// ---------------------------------------------------------------------------

/// Channel patterns in evaluation priority, most specific first.
///
/// A column is claimed by the first matching entry and skipped by later
/// ones. `std` is anchored at both ends so suffixed columns never count as
/// plain standard deviations; `sdir` is checked before `dir`.
const CHANNEL_PATTERNS: [(ChannelType, &str); 8] = [
    (ChannelType::StdDtr, r"^std\d+(\.\d+)?_detrend$"),
    (ChannelType::Std, r"^std\d+(\.\d+)?$"),
    (ChannelType::Vel, r"^vel\d+(\.\d+)?"),
    (ChannelType::Temp, r"^temp\d+(\.\d+)?"),
    (ChannelType::Hum, r"^hum\d+(\.\d+)?"),
    (ChannelType::Press, r"^press\d+(\.\d+)?"),
    (ChannelType::Sdir, r"^sdir\d+(\.\d+)?"),
    (ChannelType::Dir, r"^dir\d+(\.\d+)?"),
];

static COMPILED: Lazy<Vec<(ChannelType, Regex)>> = Lazy::new(|| {
    CHANNEL_PATTERNS
        .iter()
        .map(|(t, p)| (*t, Regex::new(p).expect("channel pattern table is valid")))
        .collect()
});

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Assign every recognised column of `dataset` to exactly one channel type.
///
/// All configured types are present in the result; columns keep their
/// dataset order within each type.
pub fn classify(dataset: &Dataset) -> ChannelCatalog {
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut map: BTreeMap<ChannelType, Vec<String>> = BTreeMap::new();

    for (channel_type, pattern) in COMPILED.iter() {
        let members = dataset
            .column_names()
            .filter(|col| !claimed.contains(col) && pattern.is_match(col))
            .collect::<Vec<_>>();
        claimed.extend(members.iter().copied());
        map.insert(
            *channel_type,
            members.into_iter().map(str::to_string).collect(),
        );
    }

    ChannelCatalog::from_map(map)
}

/// Classify and keep only the named types.
///
/// Names are the wire names (`vel`, `std_dtr`, ...). An unknown name fails
/// the whole request; duplicates collapse.
pub fn classify_types<S: AsRef<str>>(dataset: &Dataset, types: &[S]) -> Result<ChannelCatalog> {
    let wanted = parse_types(types)?;
    Ok(classify(dataset).restrict(&wanted))
}

/// Parse wire names into channel types, failing on the first unknown one.
pub fn parse_types<S: AsRef<str>>(types: &[S]) -> Result<Vec<ChannelType>> {
    let mut wanted = types
        .iter()
        .map(|t| t.as_ref().parse::<ChannelType>())
        .collect::<Result<Vec<_>>>()?;
    wanted.sort();
    wanted.dedup();
    Ok(wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Channel;
    use crate::error::StatsError;

    const COLUMNS: [&str; 17] = [
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
        "battery",
        "comment",
    ];

    fn dataset() -> Dataset {
        Dataset::new(
            Vec::new(),
            COLUMNS.iter().map(|c| Channel::new(*c, Vec::new())).collect(),
        )
        .unwrap()
    }

    #[test]
    fn classifies_sensor_columns() {
        let catalog = classify(&dataset());
        assert_eq!(catalog.get(ChannelType::Vel).unwrap(), ["vel58.3", "vel47.5", "vel32"]);
        assert_eq!(catalog.get(ChannelType::Std).unwrap(), ["std58.3", "std47.5", "std32"]);
        assert_eq!(
            catalog.get(ChannelType::StdDtr).unwrap(),
            ["std58.3_detrend", "std47.5_detrend", "std32_detrend"]
        );
        assert_eq!(catalog.get(ChannelType::Temp).unwrap(), ["temp56.8", "temp10"]);
        assert_eq!(catalog.get(ChannelType::Dir).unwrap(), ["dir56.3"]);
        assert_eq!(catalog.get(ChannelType::Sdir).unwrap(), ["sdir56.3"]);
    }

    #[test]
    fn catalog_is_a_partition_of_matching_columns() {
        let catalog = classify(&dataset());
        let mut all: Vec<&str> = catalog
            .iter()
            .flat_map(|(_, cols)| cols.iter().map(String::as_str))
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total, "a column appeared under two types");
        assert_eq!(total, COLUMNS.len() - 2);
        assert!(!all.contains(&"battery"));
        assert!(!all.contains(&"comment"));
    }

    #[test]
    fn suffixed_std_columns_are_unclassified() {
        let ds = Dataset::new(
            Vec::new(),
            ["std58.3", "std58.3_raw", "std58.3_detrend_v2", "std58.3_detrend"]
                .iter()
                .map(|c| Channel::new(*c, Vec::new()))
                .collect(),
        )
        .unwrap();
        let catalog = classify(&ds);
        assert_eq!(catalog.get(ChannelType::Std).unwrap(), ["std58.3"]);
        assert_eq!(catalog.get(ChannelType::StdDtr).unwrap(), ["std58.3_detrend"]);
        assert!(catalog
            .iter()
            .all(|(_, cols)| !cols.iter().any(|c| c.contains("_raw") || c.ends_with("_v2"))));
    }

    #[test]
    fn classification_is_deterministic() {
        let ds = dataset();
        assert_eq!(classify(&ds), classify(&ds));
    }

    #[test]
    fn restricted_catalog_has_only_requested_keys() {
        let catalog = classify_types(&dataset(), &["hum", "vel", "hum"]).unwrap();
        let keys: Vec<ChannelType> = catalog.iter().map(|(t, _)| t).collect();
        assert_eq!(keys, [ChannelType::Vel, ChannelType::Hum]);
    }

    #[test]
    fn unknown_type_is_a_validation_error() {
        let err = classify_types(&dataset(), &["vel", "velocity"]).unwrap_err();
        assert_eq!(
            err,
            StatsError::Validation("Requested invalid channel type: velocity".into())
        );
    }
}
