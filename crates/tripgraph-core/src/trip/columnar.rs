//! Columnar trip file reading.
//!
//! The TLC publishes monthly trip data as Parquet with native timestamp and
//! numeric columns. Each batch is cast to the types [`RawTripRow`] needs, so
//! integer zone ids of any width and timestamps of any unit are accepted.
//! A row with a null in a required column is counted as malformed.

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, TimestampSecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use tracing::{debug, info};

use super::model::{RawTripRow, TIMESTAMP_FORMAT};
use super::reader::{ReadOutcome, REQUIRED_COLUMNS};
use crate::error::{CoreError, CoreResult};

/// Read raw trip rows from Parquet data.
pub fn read_trip_batches<R: ChunkReader + 'static>(input: R) -> CoreResult<ReadOutcome> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(input)?;
    for column in REQUIRED_COLUMNS {
        if builder.schema().index_of(column).is_err() {
            return Err(CoreError::MissingColumn(column.to_string()));
        }
    }

    let reader = builder.build()?;
    let mut outcome = ReadOutcome::default();
    let mut offset = 0;

    for batch_result in reader {
        let batch: RecordBatch = batch_result?;
        read_batch(&batch, offset, &mut outcome)?;
        offset += batch.num_rows();
    }

    Ok(outcome)
}

/// Read raw trip rows from a Parquet file on disk.
pub fn read_trip_parquet(path: impl AsRef<Path>) -> CoreResult<ReadOutcome> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let outcome = read_trip_batches(file)?;
    info!(
        path = %path.display(),
        rows = outcome.rows.len(),
        malformed = outcome.malformed,
        "Read trip file"
    );
    Ok(outcome)
}

fn read_batch(batch: &RecordBatch, offset: usize, outcome: &mut ReadOutcome) -> CoreResult<()> {
    let seconds = DataType::Timestamp(TimeUnit::Second, None);
    let pickup_col = cast_column(batch, "tpep_pickup_datetime", &seconds)?;
    let dropoff_col = cast_column(batch, "tpep_dropoff_datetime", &seconds)?;
    let pu_col = cast_column(batch, "PULocationID", &DataType::Int64)?;
    let do_col = cast_column(batch, "DOLocationID", &DataType::Int64)?;
    let distance_col = cast_column(batch, "trip_distance", &DataType::Float64)?;
    let fare_col = cast_column(batch, "fare_amount", &DataType::Float64)?;

    let pickup = downcast::<TimestampSecondArray>(&pickup_col, "tpep_pickup_datetime")?;
    let dropoff = downcast::<TimestampSecondArray>(&dropoff_col, "tpep_dropoff_datetime")?;
    let pickup_zone = downcast::<Int64Array>(&pu_col, "PULocationID")?;
    let dropoff_zone = downcast::<Int64Array>(&do_col, "DOLocationID")?;
    let distance = downcast::<Float64Array>(&distance_col, "trip_distance")?;
    let fare = downcast::<Float64Array>(&fare_col, "fare_amount")?;

    for i in 0..batch.num_rows() {
        let columns: [&dyn Array; 6] = [pickup, dropoff, pickup_zone, dropoff_zone, distance, fare];
        if columns.iter().any(|col| col.is_null(i)) {
            debug!(row = offset + i, "Skipping trip row with null field");
            outcome.malformed += 1;
            continue;
        }

        let (Some(pickup_at), Some(dropoff_at)) =
            (pickup.value_as_datetime(i), dropoff.value_as_datetime(i))
        else {
            debug!(row = offset + i, "Skipping trip row with out-of-range timestamp");
            outcome.malformed += 1;
            continue;
        };

        outcome.rows.push(RawTripRow {
            pickup_datetime: pickup_at.format(TIMESTAMP_FORMAT).to_string(),
            dropoff_datetime: dropoff_at.format(TIMESTAMP_FORMAT).to_string(),
            pickup_zone: pickup_zone.value(i),
            dropoff_zone: dropoff_zone.value(i),
            distance: distance.value(i),
            fare: fare.value(i),
        });
    }

    Ok(())
}

/// Cast a named column; values that do not fit become nulls.
fn cast_column(batch: &RecordBatch, name: &str, to: &DataType) -> CoreResult<ArrayRef> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| CoreError::MissingColumn(name.to_string()))?;
    Ok(cast(column.as_ref(), to)?)
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, name: &str) -> CoreResult<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| CoreError::MissingColumn(format!("{} has an unsupported type", name)))
}
