use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use clap::{Parser, Subcommand, ValueEnum};

use channel_stats::config::StorageConfig;
use channel_stats::data::model::StatsResult;
use channel_stats::{ErrorKind, StatsError, StatsService};

#[derive(Parser)]
#[command(name = "channel-stats")]
#[command(about = "Store sensor Parquet files and query channel statistics")]
struct Cli {
    #[command(flatten)]
    storage: StorageConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a Parquet file; prints its file id
    Put {
        /// Parquet file to upload
        file: PathBuf,
    },
    /// List channel ids grouped by type
    Channels {
        file_id: String,

        /// Only list these channel types (vel, std, std_dtr, temp, hum, press, dir, sdir)
        #[arg(long = "type")]
        types: Vec<String>,
    },
    /// Mean and standard deviation per channel
    Stats {
        file_id: String,

        /// Channel id to include (repeatable); all channels when omitted
        #[arg(long = "channel")]
        channels: Vec<String>,

        /// START [END] as YYYY-MM-DD; END defaults to now
        #[arg(long, num_args = 1..)]
        date_range: Vec<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Table,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let store = cli.storage.open().context("opening storage backend")?;
    let service = StatsService::new(Arc::new(store));
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Put { file } => {
            let data = std::fs::read(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let blob = service.store_blob(&data)?;
            serde_json::to_writer_pretty(&mut out, &blob)?;
        }
        Commands::Channels { file_id, types } => {
            let types = (!types.is_empty()).then_some(types.as_slice());
            let catalog = service.list_channels(&file_id, types)?;
            serde_json::to_writer_pretty(&mut out, &catalog)?;
        }
        Commands::Stats {
            file_id,
            channels,
            date_range,
            format,
        } => {
            let channels = (!channels.is_empty()).then_some(channels.as_slice());
            let bounds: Vec<Option<&str>> = date_range.iter().map(|s| Some(s.as_str())).collect();
            let stats = service.compute_stats_in(&file_id, channels, &bounds)?;
            write_stats(&mut out, &stats, format)?;
        }
    }

    writeln!(out)?;
    Ok(())
}

fn write_stats(out: &mut impl Write, stats: &StatsResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => serde_json::to_writer_pretty(out, stats)?,
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(["channel", "mean", "std"])?;
            let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
            for (channel, s) in stats {
                let (mean, std) = (cell(s.mean), cell(s.std));
                writer.write_record([channel.as_str(), mean.as_str(), std.as_str()])?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            let columns: Vec<ArrayRef> = vec![
                Arc::new(StringArray::from_iter_values(stats.keys())),
                Arc::new(Float64Array::from_iter(stats.values().map(|s| s.mean))),
                Arc::new(Float64Array::from_iter(stats.values().map(|s| s.std))),
            ];
            let batch = RecordBatch::try_from_iter(["channel", "mean", "std"].into_iter().zip(columns))?;
            write!(out, "{}", pretty_format_batches(&[batch])?)?;
        }
    }
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<StatsError>().map(StatsError::kind) {
        Some(ErrorKind::Validation) => 2,
        Some(ErrorKind::NotFound) => 3,
        _ => 1,
    }
}
