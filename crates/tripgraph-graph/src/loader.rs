//! Trip records to `(:Location)-[:TRIP]->(:Location)` loading.
//!
//! Each trip is one store request that upserts both endpoints by `name` and
//! then creates a new `TRIP` edge, so an edge never exists without its
//! endpoints. Locations are never duplicated; trips always are.

use serde::Serialize;
use tracing::{error, info, warn};
use tripgraph_core::TripRecord;

use crate::error::GraphResult;
use crate::schema::initialize_schema;
use crate::store::GraphStore;

/// Result of a load operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub nodes_created: usize,
    pub edges_created: usize,
}

impl LoadSummary {
    pub fn merge(&mut self, other: &LoadSummary) {
        self.nodes_created += other.nodes_created;
        self.edges_created += other.edges_created;
    }
}

/// Load trips into the graph on top of whatever is already there.
pub async fn load<S: GraphStore + ?Sized>(store: &S, trips: &[TripRecord]) -> GraphResult<LoadSummary> {
    let mut summary = LoadSummary::default();

    for trip in trips {
        let write = match store.upsert_trip(trip).await {
            Ok(write) => write,
            Err(e) => {
                error!(
                    loaded = summary.edges_created,
                    remaining = trips.len() - summary.edges_created,
                    error = %e,
                    "Trip load interrupted"
                );
                return Err(e);
            }
        };
        summary.nodes_created += write.nodes_created();
        summary.edges_created += 1;
    }

    info!(
        nodes_created = summary.nodes_created,
        edges_created = summary.edges_created,
        "Trips loaded"
    );
    Ok(summary)
}

/// Replace the whole graph with `trips`.
///
/// Destructive: every node and relationship in the database is deleted first,
/// including data that did not come from trip files. Must not run while any
/// analytic query is in flight.
pub async fn full_reload<S: GraphStore + ?Sized>(
    store: &S,
    trips: &[TripRecord],
) -> GraphResult<LoadSummary> {
    reset_graph(store).await?;
    load(store, trips).await
}

/// Delete everything and recreate the schema constraints.
pub async fn reset_graph<S: GraphStore + ?Sized>(store: &S) -> GraphResult<()> {
    warn!("Deleting all existing nodes and relationships");
    store.delete_all().await?;
    info!("Existing data deleted");
    initialize_schema(store).await
}
