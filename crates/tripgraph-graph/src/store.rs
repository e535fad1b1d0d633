//! The logical operations the loader and analytics need from a graph store.
//!
//! [`Neo4jStore`](crate::Neo4jStore) implements them with Cypher and GDS
//! procedures; tests use an in-memory double.

use async_trait::async_trait;
use serde::Serialize;
use tripgraph_core::{TripRecord, ZoneId};

use crate::error::GraphResult;
use crate::projection::ProjectionHandle;

/// Node label for taxi zones.
pub const LOCATION_LABEL: &str = "Location";

/// Relationship type for trips.
pub const TRIP_TYPE: &str = "TRIP";

/// PageRank damping factor.
pub const DAMPING_FACTOR: f64 = 0.85;

/// Which endpoints of a trip were newly created by an upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TripWrite {
    pub pickup_created: bool,
    pub dropoff_created: bool,
}

impl TripWrite {
    pub fn nodes_created(&self) -> usize {
        usize::from(self.pickup_created) + usize::from(self.dropoff_created)
    }
}

/// Node and relationship counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphCounts {
    pub nodes: usize,
    pub relationships: usize,
}

/// What a projection materializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionSpec {
    pub name: String,
    pub node_label: String,
    pub edge_type: String,
    /// Relationship properties loaded into the projection; the only usable weights.
    pub edge_properties: Vec<String>,
}

impl ProjectionSpec {
    /// Projection of `Location` nodes and `TRIP` edges.
    pub fn trips(name: impl Into<String>, edge_properties: Vec<String>) -> Self {
        Self {
            name: name.into(),
            node_label: LOCATION_LABEL.to_string(),
            edge_type: TRIP_TYPE.to_string(),
            edge_properties,
        }
    }

    /// Like [`trips`](Self::trips) but with a per-session suffix on `base`,
    /// so concurrent callers never share (or drop) each other's projection.
    pub fn session_scoped(base: &str, edge_properties: Vec<String>) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self::trips(format!("{}-{}", base, &suffix[..12]), edge_properties)
    }
}

/// Sizes reported by the store when a projection is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectionInfo {
    pub node_count: u64,
    pub relationship_count: u64,
}

/// Raw output of a BFS run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BfsTrace {
    /// Zone ids in the order the traversal visited them, starting at the source.
    pub visited: Vec<ZoneId>,
    /// Distinct directed edges between visited nodes, as held by the projection.
    pub edges: Vec<(ZoneId, ZoneId)>,
}

/// PageRank configuration passed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRankParams {
    pub max_iterations: u32,
    pub damping_factor: f64,
    pub weight_property: Option<String>,
}

/// A node's centrality score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeScore {
    pub id: ZoneId,
    pub score: f64,
}

/// Logical graph store operations.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Delete every node and relationship in the database.
    async fn delete_all(&self) -> GraphResult<()>;

    /// Create constraints and indexes. Idempotent.
    async fn ensure_schema(&self) -> GraphResult<()>;

    /// Upsert both endpoint locations and create one trip edge, as one request.
    async fn upsert_trip(&self, trip: &TripRecord) -> GraphResult<TripWrite>;

    async fn counts(&self) -> GraphResult<GraphCounts>;

    async fn projection_exists(&self, name: &str) -> GraphResult<bool>;

    async fn create_projection(&self, spec: &ProjectionSpec) -> GraphResult<ProjectionInfo>;

    /// Drop a projection. Returns `false` if it did not exist.
    async fn drop_projection(&self, name: &str) -> GraphResult<bool>;

    /// Run BFS from `start` toward `end` over the projection's own edges.
    /// `None` if either node is missing.
    async fn bfs_trace(
        &self,
        projection: &ProjectionHandle,
        start: ZoneId,
        end: ZoneId,
    ) -> GraphResult<Option<BfsTrace>>;

    /// Stream PageRank scores without writing to the persisted graph.
    async fn page_rank_stream(
        &self,
        projection: &ProjectionHandle,
        params: &PageRankParams,
    ) -> GraphResult<Vec<NodeScore>>;

    /// Write PageRank scores to `property` on every projected node.
    /// Returns the number of properties written.
    async fn page_rank_write(
        &self,
        projection: &ProjectionHandle,
        params: &PageRankParams,
        property: &str,
    ) -> GraphResult<u64>;

    /// Read `property` from every node with `label` that has it.
    async fn read_node_scores(&self, label: &str, property: &str) -> GraphResult<Vec<NodeScore>>;

    /// Remove `property` from every node with `label`. Returns the number of nodes touched.
    async fn remove_node_property(&self, label: &str, property: &str) -> GraphResult<u64>;
}
