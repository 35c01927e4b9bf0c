use super::filter::{row_span, DateRange};
use super::model::{Channel, ChannelStats, Dataset, StatsResult};
use crate::error::{Result, StatsError};

/// Mean and sample standard deviation for each requested channel within
/// `range`.
///
/// With no ids (or an empty list) every column is used. The first id that
/// is not a dataset column fails the whole request. Missing samples are
/// skipped; an empty selection yields nulls rather than an error.
pub fn compute<S: AsRef<str>>(
    dataset: &Dataset,
    channel_ids: Option<&[S]>,
    range: &DateRange,
) -> Result<StatsResult> {
    let channels = resolve_channels(dataset, channel_ids)?;
    let span = row_span(dataset, range);

    Ok(channels
        .into_iter()
        .map(|ch| {
            let stats = summarize(ch.values[span.clone()].iter().flatten().copied());
            (ch.name.clone(), stats)
        })
        .collect())
}

fn resolve_channels<'a, S: AsRef<str>>(
    dataset: &'a Dataset,
    channel_ids: Option<&[S]>,
) -> Result<Vec<&'a Channel>> {
    match channel_ids {
        Some(ids) if !ids.is_empty() => ids
            .iter()
            .map(|id| {
                let id = id.as_ref();
                dataset
                    .channel(id)
                    .ok_or_else(|| StatsError::not_found(format!("Channel_id {id} is not available")))
            })
            .collect(),
        _ => Ok(dataset.channels().iter().collect()),
    }
}

/// Two-pass mean / sample std (n - 1 denominator).
fn summarize(values: impl Iterator<Item = f64> + Clone) -> ChannelStats {
    let (n, sum) = values.clone().fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if n == 0 {
        return ChannelStats::default();
    }
    let mean = sum / n as f64;
    let std = (n > 1).then(|| {
        let ss: f64 = values.map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });
    ChannelStats {
        mean: Some(mean),
        std,
    }
}
