//! Trip records and their normalization.
//!
//! `normalize` is a pure transformation: it keeps the rows a [`FilterPolicy`]
//! accepts, parses their timestamps, and counts what was dropped. Nothing is
//! written to disk, so the result can be fed to any loader.

pub mod columnar;
pub mod model;
pub mod reader;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::zones::FilterPolicy;
use model::{parse_timestamp, RawTripRow, TripRecord};

/// Outcome of normalizing a batch of raw rows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizeReport {
    /// Kept rows, in input order.
    pub records: Vec<TripRecord>,
    /// Rows rejected by the zone or threshold filter.
    pub filtered_out: usize,
    /// Rows dropped because a timestamp did not parse.
    pub malformed: usize,
}

impl NormalizeReport {
    pub fn kept(&self) -> usize {
        self.records.len()
    }

    /// Total number of input rows seen.
    pub fn total(&self) -> usize {
        self.records.len() + self.filtered_out + self.malformed
    }
}

/// Filter and normalize raw trip rows.
pub fn normalize<I>(rows: I, policy: &FilterPolicy) -> NormalizeReport
where
    I: IntoIterator<Item = RawTripRow>,
{
    let mut report = NormalizeReport::default();

    for (index, row) in rows.into_iter().enumerate() {
        if !policy.accepts(&row) {
            report.filtered_out += 1;
            continue;
        }

        match normalize_row(index, row) {
            Ok(record) => report.records.push(record),
            Err(e) => {
                debug!(error = %e, "Dropping malformed trip row");
                report.malformed += 1;
            }
        }
    }

    info!(
        kept = report.kept(),
        filtered_out = report.filtered_out,
        malformed = report.malformed,
        "Normalized trip rows"
    );

    report
}

/// Parse the timestamps of a single row that already passed filtering.
pub fn normalize_row(index: usize, row: RawTripRow) -> Result<TripRecord, CoreError> {
    let pickup_at = parse_timestamp(&row.pickup_datetime).map_err(|e| {
        CoreError::malformed(index, format!("pickup timestamp '{}': {}", row.pickup_datetime, e))
    })?;
    let dropoff_at = parse_timestamp(&row.dropoff_datetime).map_err(|e| {
        CoreError::malformed(index, format!("dropoff timestamp '{}': {}", row.dropoff_datetime, e))
    })?;

    Ok(TripRecord {
        pickup_at,
        dropoff_at,
        pickup_zone: row.pickup_zone,
        dropoff_zone: row.dropoff_zone,
        distance: row.distance,
        fare: row.fare,
    })
}
