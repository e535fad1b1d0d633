//! # Tripgraph Graph
//!
//! Neo4j integration for trip graphs.
//!
//! Loads normalized trips as `(:Location)-[:TRIP]->(:Location)`, manages GDS
//! projections, and runs BFS path and PageRank queries over them.

pub mod analytics;
pub mod client;
pub mod error;
pub mod loader;
pub mod projection;
pub mod queries;
pub mod schema;
pub mod store;

#[cfg(test)]
mod mock;

pub use analytics::{AnalyticsSettings, TripAnalytics};
pub use client::{GraphConfig, Neo4jStore};
pub use error::{GraphError, GraphResult};
pub use loader::{full_reload, load, reset_graph, LoadSummary};
pub use projection::{EnsureMode, ProjectionHandle, ProjectionManager};
pub use queries::centrality::{RankOptions, RankOutcome, ScoreMode};
pub use queries::path::PathOutcome;
pub use store::{GraphCounts, GraphStore, NodeScore, ProjectionSpec};
