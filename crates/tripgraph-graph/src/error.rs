//! Error types for graph store operations.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the graph store and the analytics built on it.
///
/// "No path" and "no nodes to rank" are not errors; they are variants of
/// [`PathOutcome`](crate::PathOutcome) and [`RankOutcome`](crate::RankOutcome).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Graph store unavailable during {operation}: {reason}")]
    StoreUnavailable { operation: String, reason: String },

    #[error("Graph store timed out during {operation} after {after:?}")]
    StoreTimeout { operation: String, after: Duration },

    #[error("Graph query failed during {operation}: {reason}")]
    Query { operation: String, reason: String },

    #[error("Failed to create projection '{name}': {reason}")]
    ProjectionCreateFailed { name: String, reason: String },

    #[error("Cleanup failed during {operation}: {reason}")]
    Cleanup { operation: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

impl GraphError {
    pub fn unavailable(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::StoreUnavailable {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    pub fn query(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Query {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::StoreTimeout {
            operation: operation.into(),
            after,
        }
    }

    /// Connection-level failures a caller may retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. } | Self::StoreTimeout { .. })
    }
}
