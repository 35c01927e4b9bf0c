use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use channel_stats::data::loader::encode_parquet;
use channel_stats::data::model::{Channel, Dataset};

/// Write a year of synthetic met-mast readings to a Parquet file.
#[derive(Parser)]
#[command(name = "generate-sample")]
struct Args {
    #[arg(long, default_value = "sample_data.parquet")]
    output: PathBuf,

    /// Minutes between rows
    #[arg(long, default_value_t = 10)]
    interval_minutes: i64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// (column, baseline, seasonal amplitude, noise)
const SENSORS: [(&str, f64, f64, f64); 15] = [
    ("vel58.3", 7.5, 1.5, 2.0),
    ("std58.3", 1.1, 0.2, 0.3),
    ("std58.3_detrend", 0.9, 0.2, 0.25),
    ("temp56.8", 12.0, 9.0, 1.5),
    ("hum56.8", 72.0, 10.0, 6.0),
    ("press56.8", 1013.0, 4.0, 3.0),
    ("dir56.3", 225.0, 30.0, 40.0),
    ("sdir56.3", 12.0, 3.0, 4.0),
    ("vel47.5", 7.0, 1.4, 1.9),
    ("std47.5", 1.0, 0.2, 0.3),
    ("std47.5_detrend", 0.85, 0.2, 0.25),
    ("vel32", 6.2, 1.2, 1.7),
    ("std32", 0.95, 0.2, 0.3),
    ("std32_detrend", 0.8, 0.2, 0.25),
    ("temp10", 12.5, 9.5, 1.6),
];

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let start: NaiveDateTime = NaiveDate::from_ymd_opt(2019, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("sample start date")?;
    let end = start + Duration::days(365);
    let step = Duration::minutes(args.interval_minutes.max(1));

    let mut timestamps = Vec::new();
    let mut ts = start;
    while ts < end {
        timestamps.push(ts);
        ts += step;
    }

    let mut channels = Vec::with_capacity(SENSORS.len());
    for (name, base, amplitude, noise) in SENSORS {
        let jitter = Normal::new(0.0, noise)?;
        let values = timestamps
            .iter()
            .map(|t| {
                // ~0.5% dropouts, stored as nulls.
                if rng.gen_bool(0.005) {
                    return None;
                }
                let phase = (*t - start).num_minutes() as f64 / (365.0 * 24.0 * 60.0);
                let season = (2.0 * std::f64::consts::PI * (phase - 0.3)).sin();
                Some(base + amplitude * season + jitter.sample(&mut rng))
            })
            .collect();
        channels.push(Channel::new(name, values));
    }

    let dataset = Dataset::new(timestamps, channels)?;
    let bytes = encode_parquet(&dataset)?;
    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Wrote {} rows x {} channels to {}",
        dataset.len(),
        dataset.channels().len(),
        args.output.display()
    );
    Ok(())
}
