//! # Tripgraph Core
//!
//! Trip record model and the ETL steps that run before anything touches the
//! graph store: reading CSV or Parquet trip files, filtering by zone allow-list and
//! thresholds, and normalizing timestamps.

pub mod error;
pub mod trip;
pub mod zones;

pub use error::{CoreError, CoreResult};
pub use trip::model::{RawTripRow, TripRecord, ZoneId};
pub use trip::columnar::{read_trip_batches, read_trip_parquet};
pub use trip::reader::{read_trip_file, read_trip_rows, read_trips, ReadOutcome};
pub use trip::{normalize, NormalizeReport};
pub use zones::{FilterPolicy, BRONX_ZONES};
