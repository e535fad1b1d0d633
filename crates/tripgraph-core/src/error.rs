//! Error types for trip record ingestion.

use thiserror::Error;

/// Errors raised while reading and normalizing trip records.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ingestion operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a malformed record error.
    pub fn malformed(row: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            row,
            reason: reason.into(),
        }
    }

    /// Whether the error only concerns a single row (and the row can be dropped).
    pub fn is_row_level(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}
