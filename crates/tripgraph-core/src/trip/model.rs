//! Trip record models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Taxi zone identifier (`PULocationID` / `DOLocationID` in the source data).
pub type ZoneId = i64;

/// Timestamp format used by the trip files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A trip row as read from the input file, before any validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTripRow {
    #[serde(rename = "tpep_pickup_datetime")]
    pub pickup_datetime: String,
    #[serde(rename = "tpep_dropoff_datetime")]
    pub dropoff_datetime: String,
    #[serde(rename = "PULocationID")]
    pub pickup_zone: ZoneId,
    #[serde(rename = "DOLocationID")]
    pub dropoff_zone: ZoneId,
    #[serde(rename = "trip_distance")]
    pub distance: f64,
    #[serde(rename = "fare_amount")]
    pub fare: f64,
}

/// A trip that passed filtering, with parsed timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRecord {
    pub pickup_at: NaiveDateTime,
    pub dropoff_at: NaiveDateTime,
    pub pickup_zone: ZoneId,
    pub dropoff_zone: ZoneId,
    pub distance: f64,
    pub fare: f64,
}

impl TripRecord {
    /// Pickup timestamp in ISO-8601 form (`2022-03-01T00:13:08`).
    pub fn pickup_iso(&self) -> String {
        self.pickup_at.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    /// Dropoff timestamp in ISO-8601 form.
    pub fn dropoff_iso(&self) -> String {
        self.dropoff_at.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    /// Whether pickup and dropoff are the same zone.
    pub fn is_loop(&self) -> bool {
        self.pickup_zone == self.dropoff_zone
    }
}

/// Parse a trip timestamp (`YYYY-MM-DD HH:MM:SS`).
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
}
