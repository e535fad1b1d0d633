//! Neo4j connection client and the Cypher/GDS implementation of [`GraphStore`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query, Row};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};
use tripgraph_core::{TripRecord, ZoneId};

use crate::error::{GraphError, GraphResult};
use crate::projection::ProjectionHandle;
use crate::schema::SCHEMA_STATEMENTS;
use crate::store::{
    BfsTrace, GraphCounts, GraphStore, NodeScore, PageRankParams, ProjectionInfo, ProjectionSpec,
    TripWrite, LOCATION_LABEL, TRIP_TYPE,
};

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
    pub fetch_size: usize,
    /// Upper bound for any single store round trip.
    pub query_timeout_secs: u64,
    /// Connection attempts made by [`Neo4jStore::connect_with_retry`].
    pub connect_attempts: u32,
    pub connect_backoff_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "tripgraph_dev".to_string(),
            database: "neo4j".to_string(),
            max_connections: 4,
            fetch_size: 500,
            query_timeout_secs: 60,
            connect_attempts: 10,
            connect_backoff_secs: 10,
        }
    }
}

impl GraphConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn connect_backoff(&self) -> Duration {
        Duration::from_secs(self.connect_backoff_secs)
    }
}

/// Run `fut`, turning an elapsed deadline into [`GraphError::StoreTimeout`].
pub(crate) async fn with_timeout<T, F>(operation: &str, after: Duration, fut: F) -> GraphResult<T>
where
    F: Future<Output = GraphResult<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(GraphError::timeout(operation, after)),
    }
}

/// Map a driver error to the store taxonomy.
///
/// Only transport failures count as the store being unavailable. Rejected
/// credentials, bad URIs and invalid config are query errors and never retried.
fn driver_error(operation: &str, e: neo4rs::Error) -> GraphError {
    match e {
        neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError => {
            GraphError::unavailable(operation, e)
        }
        other => GraphError::query(operation, other),
    }
}

/// Call `attempt` up to `attempts` times, sleeping `backoff` between calls,
/// for as long as it fails with a retryable error.
async fn retry_while_unavailable<T, F, Fut>(
    attempts: u32,
    backoff: Duration,
    mut attempt: F,
) -> GraphResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GraphResult<T>>,
{
    let attempts = attempts.max(1);
    let mut tried = 1;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if tried < attempts && e.is_retryable() => {
                warn!(attempt = tried, attempts, error = %e, "Neo4j not ready, retrying");
                tokio::time::sleep(backoff).await;
                tried += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Keep only characters valid in an unquoted Cypher identifier.
fn identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn field<T: DeserializeOwned>(row: &Row, operation: &str, name: &str) -> GraphResult<T> {
    row.get(name)
        .map_err(|e| GraphError::query(operation, format!("failed to get field '{}': {:?}", name, e)))
}

/// Graph store backed by a Neo4j server with the GDS plugin.
#[derive(Clone)]
pub struct Neo4jStore {
    graph: Graph,
    timeout: Duration,
}

impl Neo4jStore {
    /// Connect and verify the server answers queries.
    ///
    /// neo4rs creates its pool lazily, so a `RETURN 1` ping forces the bolt
    /// handshake and an unreachable server fails here, not on first use.
    pub async fn connect(config: &GraphConfig) -> GraphResult<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| driver_error("connect", e))?;

        let timeout = config.query_timeout();
        let graph = with_timeout("connect", timeout, async {
            Graph::connect(neo4j_config)
                .await
                .map_err(|e| driver_error("connect", e))
        })
        .await?;

        let store = Self { graph, timeout };
        store
            .execute("ping", Query::new("RETURN 1".to_string()))
            .await?;

        info!(uri = %config.uri, database = %config.database, "Connected to Neo4j");
        Ok(store)
    }

    /// Connect, retrying while the server is still starting up.
    ///
    /// Only connection-level failures are retried; a rejected login or a bad
    /// URI fails on the first attempt.
    pub async fn connect_with_retry(config: &GraphConfig) -> GraphResult<Self> {
        retry_while_unavailable(config.connect_attempts, config.connect_backoff(), || {
            Self::connect(config)
        })
        .await
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, operation: &str, query: Query) -> GraphResult<()> {
        with_timeout(operation, self.timeout, async {
            self.graph
                .run(query)
                .await
                .map_err(|e| driver_error(operation, e))
        })
        .await
    }

    /// Execute a Cypher query and collect all rows.
    pub async fn query(&self, operation: &str, query: Query) -> GraphResult<Vec<Row>> {
        with_timeout(operation, self.timeout, async {
            let mut result = self
                .graph
                .execute(query)
                .await
                .map_err(|e| driver_error(operation, e))?;

            let mut rows = Vec::new();
            while let Some(row) = result.next().await.map_err(|e| driver_error(operation, e))? {
                rows.push(row);
            }
            Ok(rows)
        })
        .await
    }

    /// Execute a Cypher query and return a single scalar value.
    pub async fn query_scalar<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: Query,
        name: &str,
    ) -> GraphResult<Option<T>> {
        let rows = self.query(operation, query).await?;
        match rows.first() {
            Some(row) => Ok(Some(field(row, operation, name)?)),
            None => Ok(None),
        }
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }

    fn parse_scores(operation: &str, rows: &[Row]) -> GraphResult<Vec<NodeScore>> {
        rows.iter()
            .map(|row| {
                Ok(NodeScore {
                    id: field(row, operation, "id")?,
                    score: field(row, operation, "score")?,
                })
            })
            .collect()
    }
}

/// `, relationshipWeightProperty: $weight` when a weight is configured.
fn weight_clause(params: &PageRankParams) -> &'static str {
    if params.weight_property.is_some() {
        ", relationshipWeightProperty: $weight"
    } else {
        ""
    }
}

fn page_rank_query(text: String, projection: &ProjectionHandle, params: &PageRankParams) -> Query {
    let mut query = Query::new(text)
        .param("graph", projection.name())
        .param("iterations", i64::from(params.max_iterations))
        .param("damping", params.damping_factor);
    if let Some(weight) = &params.weight_property {
        query = query.param("weight", weight.as_str());
    }
    query
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn delete_all(&self) -> GraphResult<()> {
        self.execute("delete_all", Query::new("MATCH (n) DETACH DELETE n".to_string()))
            .await
    }

    async fn ensure_schema(&self) -> GraphResult<()> {
        for statement in SCHEMA_STATEMENTS {
            self.execute("ensure_schema", Query::new(statement.to_string()))
                .await?;
        }
        Ok(())
    }

    async fn upsert_trip(&self, trip: &TripRecord) -> GraphResult<TripWrite> {
        let query = Query::new(format!(
            "OPTIONAL MATCH (existing_pickup:{LOCATION_LABEL} {{name: $pickup}})
             WITH existing_pickup IS NULL AS pickup_new
             OPTIONAL MATCH (existing_dropoff:{LOCATION_LABEL} {{name: $dropoff}})
             WITH pickup_new, existing_dropoff IS NULL AS dropoff_new
             MERGE (pickup:{LOCATION_LABEL} {{name: $pickup}})
             MERGE (dropoff:{LOCATION_LABEL} {{name: $dropoff}})
             CREATE (pickup)-[:{TRIP_TYPE} {{
                 distance: $distance,
                 fare: $fare,
                 pickup_dt: localdatetime($pickup_dt),
                 dropoff_dt: localdatetime($dropoff_dt)
             }}]->(dropoff)
             RETURN pickup_new, dropoff_new"
        ))
        .param("pickup", trip.pickup_zone)
        .param("dropoff", trip.dropoff_zone)
        .param("distance", trip.distance)
        .param("fare", trip.fare)
        .param("pickup_dt", trip.pickup_iso())
        .param("dropoff_dt", trip.dropoff_iso());

        let rows = self.query("upsert_trip", query).await?;
        let row = rows
            .first()
            .ok_or_else(|| GraphError::query("upsert_trip", "upsert returned no row"))?;

        let pickup_created: bool = field(row, "upsert_trip", "pickup_new")?;
        let dropoff_new: bool = field(row, "upsert_trip", "dropoff_new")?;

        Ok(TripWrite {
            pickup_created,
            dropoff_created: dropoff_new && !trip.is_loop(),
        })
    }

    async fn counts(&self) -> GraphResult<GraphCounts> {
        let node_query = Query::new("MATCH (n) RETURN count(n) as count".to_string());
        let rel_query = Query::new("MATCH ()-[r]->() RETURN count(r) as count".to_string());

        let nodes: i64 = self
            .query_scalar("counts", node_query, "count")
            .await?
            .unwrap_or(0);
        let relationships: i64 = self
            .query_scalar("counts", rel_query, "count")
            .await?
            .unwrap_or(0);

        Ok(GraphCounts {
            nodes: nodes as usize,
            relationships: relationships as usize,
        })
    }

    async fn projection_exists(&self, name: &str) -> GraphResult<bool> {
        let query = Query::new(
            "CALL gds.graph.exists($name) YIELD exists RETURN exists".to_string(),
        )
        .param("name", name);

        Ok(self
            .query_scalar("projection_exists", query, "exists")
            .await?
            .unwrap_or(false))
    }

    async fn create_projection(&self, spec: &ProjectionSpec) -> GraphResult<ProjectionInfo> {
        let config = if spec.edge_properties.is_empty() {
            ""
        } else {
            ", {relationshipProperties: $properties}"
        };
        let query = Query::new(format!(
            "CALL gds.graph.project($name, $label, $edge_type{config})
             YIELD nodeCount, relationshipCount
             RETURN nodeCount, relationshipCount"
        ))
        .param("name", spec.name.as_str())
        .param("label", spec.node_label.as_str())
        .param("edge_type", spec.edge_type.as_str())
        .param("properties", spec.edge_properties.clone());

        let rows = self.query("create_projection", query).await?;
        let row = rows.first().ok_or_else(|| {
            GraphError::query("create_projection", "projection returned no row")
        })?;

        let node_count: i64 = field(row, "create_projection", "nodeCount")?;
        let relationship_count: i64 = field(row, "create_projection", "relationshipCount")?;

        Ok(ProjectionInfo {
            node_count: node_count.max(0) as u64,
            relationship_count: relationship_count.max(0) as u64,
        })
    }

    async fn drop_projection(&self, name: &str) -> GraphResult<bool> {
        let query = Query::new(
            "CALL gds.graph.drop($name, false) YIELD graphName RETURN graphName".to_string(),
        )
        .param("name", name);

        let rows = self.query("drop_projection", query).await?;
        Ok(!rows.is_empty())
    }

    async fn bfs_trace(
        &self,
        projection: &ProjectionHandle,
        start: ZoneId,
        end: ZoneId,
    ) -> GraphResult<Option<BfsTrace>> {
        let label = identifier(projection.node_label());

        let bfs_query = Query::new(format!(
            "MATCH (source:{label} {{name: $start}}), (target:{label} {{name: $end}})
             CALL gds.bfs.stream($graph, {{sourceNode: source, targetNodes: [target]}})
             YIELD nodeIds
             RETURN nodeIds AS node_ids,
                    [node_id IN nodeIds | gds.util.asNode(node_id).name] AS visited"
        ))
        .param("graph", projection.name())
        .param("start", start)
        .param("end", end);

        let rows = self.query("bfs_stream", bfs_query).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let node_ids: Vec<i64> = field(row, "bfs_stream", "node_ids")?;
        let visited: Vec<ZoneId> = field(row, "bfs_stream", "visited")?;
        debug!(start, end, visited = visited.len(), "BFS stream finished");

        // Edges are read from the projection, not the persisted graph, so the
        // parents match what BFS saw.
        let edge_query = Query::new(
            "CALL gds.graph.relationships.stream($graph)
             YIELD sourceNodeId, targetNodeId
             WITH sourceNodeId, targetNodeId
             WHERE sourceNodeId IN $node_ids AND targetNodeId IN $node_ids
             RETURN DISTINCT gds.util.asNode(sourceNodeId).name AS source,
                             gds.util.asNode(targetNodeId).name AS target"
                .to_string(),
        )
        .param("graph", projection.name())
        .param("node_ids", node_ids);

        let rows = self.query("bfs_edges", edge_query).await?;
        let edges = rows
            .iter()
            .map(|row| {
                Ok((
                    field(row, "bfs_edges", "source")?,
                    field(row, "bfs_edges", "target")?,
                ))
            })
            .collect::<GraphResult<Vec<_>>>()?;

        Ok(Some(BfsTrace { visited, edges }))
    }

    async fn page_rank_stream(
        &self,
        projection: &ProjectionHandle,
        params: &PageRankParams,
    ) -> GraphResult<Vec<NodeScore>> {
        let text = format!(
            "CALL gds.pageRank.stream($graph, {{
                 maxIterations: $iterations,
                 dampingFactor: $damping{weight}
             }})
             YIELD nodeId, score
             RETURN gds.util.asNode(nodeId).name AS id, score",
            weight = weight_clause(params)
        );
        let query = page_rank_query(text, projection, params);

        let rows = self.query("page_rank_stream", query).await?;
        Self::parse_scores("page_rank_stream", &rows)
    }

    async fn page_rank_write(
        &self,
        projection: &ProjectionHandle,
        params: &PageRankParams,
        property: &str,
    ) -> GraphResult<u64> {
        let text = format!(
            "CALL gds.pageRank.write($graph, {{
                 maxIterations: $iterations,
                 dampingFactor: $damping,
                 writeProperty: $property{weight}
             }})
             YIELD nodePropertiesWritten
             RETURN nodePropertiesWritten",
            weight = weight_clause(params)
        );
        let query = page_rank_query(text, projection, params).param("property", property);

        let written: i64 = self
            .query_scalar("page_rank_write", query, "nodePropertiesWritten")
            .await?
            .unwrap_or(0);
        Ok(written.max(0) as u64)
    }

    async fn read_node_scores(&self, label: &str, property: &str) -> GraphResult<Vec<NodeScore>> {
        let query = Query::new(format!(
            "MATCH (n:{label})
             WHERE n[$property] IS NOT NULL
             RETURN n.name AS id, n[$property] AS score",
            label = identifier(label)
        ))
        .param("property", property);

        let rows = self.query("read_node_scores", query).await?;
        Self::parse_scores("read_node_scores", &rows)
    }

    async fn remove_node_property(&self, label: &str, property: &str) -> GraphResult<u64> {
        let property = identifier(property);
        let query = Query::new(format!(
            "MATCH (n:{label})
             WHERE n.{property} IS NOT NULL
             REMOVE n.{property}
             RETURN count(n) AS removed",
            label = identifier(label)
        ));

        let removed: i64 = self
            .query_scalar("remove_node_property", query, "removed")
            .await?
            .unwrap_or(0);
        Ok(removed.max(0) as u64)
    }
}
