use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, TimestampNanosecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use super::model::{Channel, Dataset};
use crate::error::{Result, StatsError};

/// Column name pandas gives an unnamed index when writing Parquet.
pub const PANDAS_INDEX_COLUMN: &str = "__index_level_0__";

/// Index column name used when encoding.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

const PARQUET_MAGIC: &[u8] = b"PAR1";

// ---------------------------------------------------------------------------
// Parquet decoding
// ---------------------------------------------------------------------------

/// Decode a Parquet file held in memory.
///
/// Expected schema:
/// - one timestamp (or date) typed column acting as the row index; the
///   pandas index column wins when several qualify
/// - numeric columns (ints and floats, nullable) are channels
/// - anything else is ignored
///
/// Works with files written by **pandas** (`df.to_parquet()`) as well as
/// [`encode_parquet`].
pub fn decode_parquet(data: Bytes) -> Result<Dataset> {
    if !data.starts_with(PARQUET_MAGIC) {
        return Err(StatsError::Parse("not a parquet file".into()));
    }

    let builder = ParquetRecordBatchReaderBuilder::try_new(data)?;
    let schema = builder.schema().clone();
    let index = index_column(&schema)?;

    let channel_cols: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(i, f)| *i != index && f.data_type().is_numeric())
        .map(|(i, _)| i)
        .collect();

    for (i, f) in schema.fields().iter().enumerate() {
        if i != index && !channel_cols.contains(&i) {
            log::debug!("skipping non-numeric column '{}' ({})", f.name(), f.data_type());
        }
    }

    let mut timestamps: Vec<NaiveDateTime> = Vec::new();
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); channel_cols.len()];

    for batch in builder.build()? {
        let batch = batch?;
        extract_timestamps(batch.column(index), &mut timestamps)?;
        for (slot, &col) in values.iter_mut().zip(&channel_cols) {
            extract_f64(batch.column(col), slot)?;
        }
    }

    let channels = channel_cols
        .iter()
        .zip(values)
        .map(|(&i, v)| Channel::new(schema.field(i).name().clone(), v))
        .collect();

    Dataset::new(timestamps, channels)
}

fn is_time_type(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64
    )
}

fn index_column(schema: &Schema) -> Result<usize> {
    let candidates: Vec<(usize, &Arc<Field>)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| is_time_type(f.data_type()))
        .collect();

    candidates
        .iter()
        .find(|(_, f)| f.name() == PANDAS_INDEX_COLUMN)
        .or_else(|| candidates.first())
        .map(|(i, _)| *i)
        .ok_or_else(|| StatsError::Parse("no timestamp index column found".into()))
}

fn extract_timestamps(col: &ArrayRef, out: &mut Vec<NaiveDateTime>) -> Result<()> {
    let nanos = cast(col, &DataType::Timestamp(TimeUnit::Nanosecond, None))?;
    let nanos = nanos
        .as_any()
        .downcast_ref::<TimestampNanosecondArray>()
        .ok_or_else(|| StatsError::Parse("index column is not a timestamp".into()))?;

    for row in 0..nanos.len() {
        if nanos.is_null(row) {
            return Err(StatsError::Parse(format!("null timestamp in row {row}")));
        }
        out.push(from_nanos(nanos.value(row)));
    }
    Ok(())
}

fn extract_f64(col: &ArrayRef, out: &mut Vec<Option<f64>>) -> Result<()> {
    let floats = cast(col, &DataType::Float64)?;
    let floats = floats
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| StatsError::Parse("expected numeric column".into()))?;
    out.extend(floats.iter());
    Ok(())
}

fn from_nanos(ns: i64) -> NaiveDateTime {
    let secs = ns.div_euclid(1_000_000_000);
    let nsec = ns.rem_euclid(1_000_000_000) as u32;
    // Any i64 nanosecond count is within chrono's range.
    DateTime::from_timestamp(secs, nsec)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Parquet encoding
// ---------------------------------------------------------------------------

/// Encode a dataset as Parquet with a nanosecond `timestamp` index column
/// followed by one nullable `Float64` column per channel.
pub fn encode_parquet(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut fields = vec![Field::new(
        TIMESTAMP_COLUMN,
        DataType::Timestamp(TimeUnit::Nanosecond, None),
        false,
    )];
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(dataset.channels().len() + 1);

    let nanos = dataset
        .timestamps()
        .iter()
        .map(|ts| {
            ts.and_utc().timestamp_nanos_opt().ok_or_else(|| {
                StatsError::Validation(format!("timestamp {ts} is out of range for parquet"))
            })
        })
        .collect::<Result<Vec<i64>>>()?;
    columns.push(Arc::new(TimestampNanosecondArray::from(nanos)));

    for ch in dataset.channels() {
        fields.push(Field::new(&ch.name, DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(ch.values.clone())));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(buf)
}
