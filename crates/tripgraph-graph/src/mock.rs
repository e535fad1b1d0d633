//! In-memory mock implementation of GraphStore for testing.
//!
//! Projections are snapshots of the node/edge collections taken at create
//! time, like GDS named graphs. BFS visit order and PageRank are simulated
//! just far enough to exercise the orchestration code. Failures can be
//! queued per operation to test cleanup and retry paths.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};
use tripgraph_core::{TripRecord, ZoneId};

use crate::error::{GraphError, GraphResult};
use crate::projection::ProjectionHandle;
use crate::store::{
    BfsTrace, GraphCounts, GraphStore, NodeScore, PageRankParams, ProjectionInfo, ProjectionSpec,
    TripWrite,
};

/// Store operations, used to count calls and queue failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    DeleteAll,
    EnsureSchema,
    UpsertTrip,
    Counts,
    ProjectionExists,
    CreateProjection,
    DropProjection,
    BfsTrace,
    PageRankStream,
    PageRankWrite,
    ReadNodeScores,
    RemoveNodeProperty,
}

#[derive(Debug, Clone)]
struct MockEdge {
    source: ZoneId,
    target: ZoneId,
    properties: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
struct Snapshot {
    nodes: BTreeSet<ZoneId>,
    /// (source, target, weights by projected property)
    edges: Vec<(ZoneId, ZoneId, BTreeMap<String, f64>)>,
}

/// Build a trip with fixed timestamps.
pub fn trip(pickup: ZoneId, dropoff: ZoneId, distance: f64, fare: f64) -> TripRecord {
    let day = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
    TripRecord {
        pickup_at: day.and_hms_opt(8, 0, 0).unwrap(),
        dropoff_at: day.and_hms_opt(8, 20, 0).unwrap(),
        pickup_zone: pickup,
        dropoff_zone: dropoff,
        distance,
        fare,
    }
}

/// In-memory mock implementation of GraphStore for testing.
#[derive(Default)]
pub struct MockGraphStore {
    /// Location nodes and their (transient) properties besides `name`.
    nodes: RwLock<BTreeMap<ZoneId, BTreeMap<String, f64>>>,
    edges: RwLock<Vec<MockEdge>>,
    projections: RwLock<HashMap<String, Snapshot>>,
    schema_ready: RwLock<bool>,
    failures: Mutex<HashMap<StoreOp, VecDeque<GraphError>>>,
    calls: Mutex<HashMap<StoreOp, usize>>,
}

impl MockGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with one trip per `(pickup, dropoff)` pair.
    pub async fn with_trips(pairs: &[(ZoneId, ZoneId)]) -> Self {
        let store = Self::new();
        for (pickup, dropoff) in pairs {
            store
                .upsert_trip(&trip(*pickup, *dropoff, 1.0, 5.0))
                .await
                .unwrap();
        }
        store.calls.lock().await.clear();
        store
    }

    /// Add a node with no edges.
    pub async fn add_location(&self, id: ZoneId) {
        self.nodes.write().await.entry(id).or_default();
    }

    /// Make the next call of `op` fail with `error`.
    pub async fn fail_next(&self, op: StoreOp, error: GraphError) {
        self.failures
            .lock()
            .await
            .entry(op)
            .or_default()
            .push_back(error);
    }

    pub async fn calls(&self, op: StoreOp) -> usize {
        self.calls.lock().await.get(&op).copied().unwrap_or(0)
    }

    pub async fn has_projection(&self, name: &str) -> bool {
        self.projections.read().await.contains_key(name)
    }

    pub async fn projection_count(&self) -> usize {
        self.projections.read().await.len()
    }

    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.edges.read().await.len()
    }

    pub async fn schema_ready(&self) -> bool {
        *self.schema_ready.read().await
    }

    /// Every property key present on any node, besides `name`.
    pub async fn node_property_keys(&self) -> BTreeSet<String> {
        self.nodes
            .read()
            .await
            .values()
            .flat_map(|props| props.keys().cloned())
            .collect()
    }

    async fn enter(&self, op: StoreOp) -> GraphResult<()> {
        *self.calls.lock().await.entry(op).or_insert(0) += 1;
        match self
            .failures
            .lock()
            .await
            .get_mut(&op)
            .and_then(|queue| queue.pop_front())
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn snapshot(&self, name: &str, operation: &str) -> GraphResult<Snapshot> {
        self.projections
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| {
                GraphError::query(operation, format!("Graph with name `{}` does not exist", name))
            })
    }

    fn page_rank(snapshot: &Snapshot, params: &PageRankParams) -> Vec<NodeScore> {
        let d = params.damping_factor;
        let weight = |props: &BTreeMap<String, f64>| match &params.weight_property {
            Some(key) => props.get(key).copied().unwrap_or(0.0),
            None => 1.0,
        };

        let mut out_weight: HashMap<ZoneId, f64> = HashMap::new();
        for (source, _, props) in &snapshot.edges {
            *out_weight.entry(*source).or_insert(0.0) += weight(props);
        }

        let mut scores: BTreeMap<ZoneId, f64> =
            snapshot.nodes.iter().map(|id| (*id, 1.0 - d)).collect();

        for _ in 0..params.max_iterations {
            let mut next: BTreeMap<ZoneId, f64> =
                snapshot.nodes.iter().map(|id| (*id, 1.0 - d)).collect();
            for (source, target, props) in &snapshot.edges {
                let total = out_weight.get(source).copied().unwrap_or(0.0);
                if total > 0.0 {
                    *next.entry(*target).or_insert(0.0) += d * scores[source] * weight(props) / total;
                }
            }
            let delta = next
                .iter()
                .map(|(id, score)| (score - scores[id]).abs())
                .fold(0.0, f64::max);
            scores = next;
            if delta < 1e-7 {
                break;
            }
        }

        scores
            .into_iter()
            .map(|(id, score)| NodeScore { id, score })
            .collect()
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn delete_all(&self) -> GraphResult<()> {
        self.enter(StoreOp::DeleteAll).await?;
        self.nodes.write().await.clear();
        self.edges.write().await.clear();
        Ok(())
    }

    async fn ensure_schema(&self) -> GraphResult<()> {
        self.enter(StoreOp::EnsureSchema).await?;
        *self.schema_ready.write().await = true;
        Ok(())
    }

    async fn upsert_trip(&self, trip: &TripRecord) -> GraphResult<TripWrite> {
        self.enter(StoreOp::UpsertTrip).await?;
        let mut nodes = self.nodes.write().await;

        let pickup_created = !nodes.contains_key(&trip.pickup_zone);
        nodes.entry(trip.pickup_zone).or_default();
        let dropoff_created = !nodes.contains_key(&trip.dropoff_zone);
        nodes.entry(trip.dropoff_zone).or_default();

        let properties = BTreeMap::from([
            ("distance".to_string(), trip.distance),
            ("fare".to_string(), trip.fare),
        ]);
        self.edges.write().await.push(MockEdge {
            source: trip.pickup_zone,
            target: trip.dropoff_zone,
            properties,
        });

        Ok(TripWrite {
            pickup_created,
            dropoff_created,
        })
    }

    async fn counts(&self) -> GraphResult<GraphCounts> {
        self.enter(StoreOp::Counts).await?;
        Ok(GraphCounts {
            nodes: self.node_count().await,
            relationships: self.edge_count().await,
        })
    }

    async fn projection_exists(&self, name: &str) -> GraphResult<bool> {
        self.enter(StoreOp::ProjectionExists).await?;
        Ok(self.has_projection(name).await)
    }

    async fn create_projection(&self, spec: &ProjectionSpec) -> GraphResult<ProjectionInfo> {
        self.enter(StoreOp::CreateProjection).await?;
        let mut projections = self.projections.write().await;
        if projections.contains_key(&spec.name) {
            return Err(GraphError::query(
                "create_projection",
                format!("A graph with name '{}' already exists", spec.name),
            ));
        }

        let nodes: BTreeSet<ZoneId> = self.nodes.read().await.keys().copied().collect();
        let mut edges = Vec::new();
        for edge in self.edges.read().await.iter() {
            let mut weights = BTreeMap::new();
            for key in &spec.edge_properties {
                let value = edge.properties.get(key).ok_or_else(|| {
                    GraphError::query(
                        "create_projection",
                        format!("Relationship property '{}' not found", key),
                    )
                })?;
                weights.insert(key.clone(), *value);
            }
            edges.push((edge.source, edge.target, weights));
        }

        let info = ProjectionInfo {
            node_count: nodes.len() as u64,
            relationship_count: edges.len() as u64,
        };
        projections.insert(spec.name.clone(), Snapshot { nodes, edges });
        Ok(info)
    }

    async fn drop_projection(&self, name: &str) -> GraphResult<bool> {
        self.enter(StoreOp::DropProjection).await?;
        Ok(self.projections.write().await.remove(name).is_some())
    }

    async fn bfs_trace(
        &self,
        projection: &ProjectionHandle,
        start: ZoneId,
        end: ZoneId,
    ) -> GraphResult<Option<BfsTrace>> {
        self.enter(StoreOp::BfsTrace).await?;
        let snapshot = self.snapshot(projection.name(), "bfs_stream").await?;
        if !snapshot.nodes.contains(&start) || !snapshot.nodes.contains(&end) {
            return Ok(None);
        }

        let mut adjacency: BTreeMap<ZoneId, BTreeSet<ZoneId>> = BTreeMap::new();
        for (source, target, _) in &snapshot.edges {
            adjacency.entry(*source).or_default().insert(*target);
        }

        let mut visited = vec![start];
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            if node == end {
                break;
            }
            for next in adjacency.get(&node).into_iter().flatten() {
                if seen.insert(*next) {
                    visited.push(*next);
                    queue.push_back(*next);
                }
            }
        }

        let edges: BTreeSet<(ZoneId, ZoneId)> = snapshot
            .edges
            .iter()
            .filter(|(s, t, _)| seen.contains(s) && seen.contains(t))
            .map(|(s, t, _)| (*s, *t))
            .collect();

        Ok(Some(BfsTrace {
            visited,
            edges: edges.into_iter().collect(),
        }))
    }

    async fn page_rank_stream(
        &self,
        projection: &ProjectionHandle,
        params: &PageRankParams,
    ) -> GraphResult<Vec<NodeScore>> {
        self.enter(StoreOp::PageRankStream).await?;
        let snapshot = self.snapshot(projection.name(), "page_rank_stream").await?;
        Ok(Self::page_rank(&snapshot, params))
    }

    async fn page_rank_write(
        &self,
        projection: &ProjectionHandle,
        params: &PageRankParams,
        property: &str,
    ) -> GraphResult<u64> {
        self.enter(StoreOp::PageRankWrite).await?;
        let snapshot = self.snapshot(projection.name(), "page_rank_write").await?;
        let scores = Self::page_rank(&snapshot, params);

        let mut nodes = self.nodes.write().await;
        for NodeScore { id, score } in &scores {
            if let Some(props) = nodes.get_mut(id) {
                props.insert(property.to_string(), *score);
            }
        }
        Ok(scores.len() as u64)
    }

    async fn read_node_scores(&self, _label: &str, property: &str) -> GraphResult<Vec<NodeScore>> {
        self.enter(StoreOp::ReadNodeScores).await?;
        Ok(self
            .nodes
            .read()
            .await
            .iter()
            .filter_map(|(id, props)| {
                props
                    .get(property)
                    .map(|score| NodeScore { id: *id, score: *score })
            })
            .collect())
    }

    async fn remove_node_property(&self, _label: &str, property: &str) -> GraphResult<u64> {
        self.enter(StoreOp::RemoveNodeProperty).await?;
        let mut removed = 0;
        for props in self.nodes.write().await.values_mut() {
            if props.remove(property).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
