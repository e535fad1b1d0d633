//! Neo4j schema initialization (constraints and indexes).

use tracing::info;

use crate::error::GraphResult;
use crate::store::GraphStore;

/// Cypher statements for schema initialization.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // Uniqueness constraints
    "CREATE CONSTRAINT location_name_unique IF NOT EXISTS FOR (l:Location) REQUIRE l.name IS UNIQUE",
];

/// Initialize Neo4j schema with constraints and indexes.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses.
pub async fn initialize_schema<S: GraphStore + ?Sized>(store: &S) -> GraphResult<()> {
    info!("Initializing Neo4j schema...");

    store.ensure_schema().await?;

    info!("Neo4j schema initialized ({} statements)", SCHEMA_STATEMENTS.len());
    Ok(())
}
