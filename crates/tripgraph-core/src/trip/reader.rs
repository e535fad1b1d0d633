//! Delimited trip file reading, and format selection by file extension.
//!
//! Expected header (extra columns are ignored):
//!
//! ```csv
//! tpep_pickup_datetime,tpep_dropoff_datetime,PULocationID,DOLocationID,trip_distance,fare_amount
//! 2022-03-01 00:13:08,2022-03-01 00:24:35,3,18,2.4,10.5
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use super::model::RawTripRow;
use crate::error::{CoreError, CoreResult};

/// Columns that must be present in the header.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "tpep_pickup_datetime",
    "tpep_dropoff_datetime",
    "PULocationID",
    "DOLocationID",
    "trip_distance",
    "fare_amount",
];

/// Rows read from a trip file.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub rows: Vec<RawTripRow>,
    /// Rows that could not be decoded (wrong arity, non-numeric fields).
    pub malformed: usize,
}

/// Read raw trip rows from any reader producing CSV with a header line.
///
/// A missing required column fails the whole read. Undecodable rows are
/// skipped and counted.
pub fn read_trip_rows<R: Read>(input: R) -> CoreResult<ReadOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(CoreError::MissingColumn(column.to_string()));
        }
    }

    let mut outcome = ReadOutcome::default();

    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                debug!(row = index, error = %e, "Skipping unreadable trip row");
                outcome.malformed += 1;
                continue;
            }
        };

        match record.deserialize::<RawTripRow>(Some(&headers)) {
            Ok(row) => outcome.rows.push(row),
            Err(e) => {
                debug!(row = index, error = %e, "Skipping undecodable trip row");
                outcome.malformed += 1;
            }
        }
    }

    Ok(outcome)
}

/// Read raw trip rows from a CSV file on disk.
pub fn read_trip_file(path: impl AsRef<Path>) -> CoreResult<ReadOutcome> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let outcome = read_trip_rows(file)?;
    info!(
        path = %path.display(),
        rows = outcome.rows.len(),
        malformed = outcome.malformed,
        "Read trip file"
    );
    Ok(outcome)
}

/// Read a trip file, choosing the format by extension.
///
/// `.parquet` files go through the columnar reader; anything else is read as
/// CSV.
pub fn read_trips(path: impl AsRef<Path>) -> CoreResult<ReadOutcome> {
    let path = path.as_ref();
    let is_parquet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

    if is_parquet {
        super::columnar::read_trip_parquet(path)
    } else {
        read_trip_file(path)
    }
}
