//! GDS projection lifecycle.
//!
//! A projection is a named in-memory snapshot of the persisted `Location` /
//! `TRIP` graph. Analytics create one on demand and drop it afterwards; it is
//! never treated as a source of truth.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GraphError, GraphResult};
use crate::store::{GraphStore, ProjectionInfo, ProjectionSpec};

/// What to do when a projection with the requested name already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnsureMode {
    /// Return the existing projection as-is, without checking its schema.
    #[default]
    Reuse,
    /// Drop the existing projection and build a fresh one.
    Recreate,
}

/// A projection known to exist in the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionHandle {
    spec: ProjectionSpec,
    /// Sizes, when this call created the projection.
    info: Option<ProjectionInfo>,
}

impl ProjectionHandle {
    pub fn new(spec: ProjectionSpec, info: Option<ProjectionInfo>) -> Self {
        Self { spec, info }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn node_label(&self) -> &str {
        &self.spec.node_label
    }

    pub fn edge_type(&self) -> &str {
        &self.spec.edge_type
    }

    pub fn edge_properties(&self) -> &[String] {
        &self.spec.edge_properties
    }

    pub fn spec(&self) -> &ProjectionSpec {
        &self.spec
    }

    pub fn info(&self) -> Option<ProjectionInfo> {
        self.info
    }

    /// Whether this handle's projection was created (not reused) by the manager.
    pub fn was_created(&self) -> bool {
        self.info.is_some()
    }

    /// `true` only when the store reported zero projected nodes.
    pub fn is_known_empty(&self) -> bool {
        self.info.is_some_and(|info| info.node_count == 0)
    }
}

/// Creates, reuses and drops projections on a [`GraphStore`].
pub struct ProjectionManager<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: GraphStore + ?Sized> ProjectionManager<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Make sure a projection named `spec.name` exists and return a handle to it.
    ///
    /// A failed create (other than a connection-level failure) drops any stale
    /// projection of the same name and retries exactly once; a second failure
    /// is [`GraphError::ProjectionCreateFailed`].
    pub async fn ensure_projection(
        &self,
        spec: &ProjectionSpec,
        mode: EnsureMode,
    ) -> GraphResult<ProjectionHandle> {
        if self.store.projection_exists(&spec.name).await? {
            match mode {
                EnsureMode::Reuse => {
                    debug!(projection = %spec.name, "Reusing existing projection");
                    return Ok(ProjectionHandle::new(spec.clone(), None));
                }
                EnsureMode::Recreate => {
                    debug!(projection = %spec.name, "Dropping existing projection before recreate");
                    self.store.drop_projection(&spec.name).await?;
                }
            }
        }

        let info = self.create_with_retry(spec).await?;
        info!(
            projection = %spec.name,
            nodes = info.node_count,
            relationships = info.relationship_count,
            "Created projection"
        );
        Ok(ProjectionHandle::new(spec.clone(), Some(info)))
    }

    async fn create_with_retry(&self, spec: &ProjectionSpec) -> GraphResult<ProjectionInfo> {
        let first = match self.store.create_projection(spec).await {
            Ok(info) => return Ok(info),
            Err(e) if e.is_retryable() => return Err(e),
            Err(e) => e,
        };

        warn!(
            projection = %spec.name,
            error = %first,
            "Projection create failed, dropping stale projection and retrying once"
        );
        if let Err(e) = self.store.drop_projection(&spec.name).await {
            warn!(projection = %spec.name, error = %e, "Failed to drop stale projection");
        }

        self.store
            .create_projection(spec)
            .await
            .map_err(|second| GraphError::ProjectionCreateFailed {
                name: spec.name.clone(),
                reason: second.to_string(),
            })
    }

    /// Drop a projection by name. Returns whether it existed.
    pub async fn drop_projection(&self, name: &str) -> GraphResult<bool> {
        let existed = self.store.drop_projection(name).await?;
        debug!(projection = name, existed, "Dropped projection");
        Ok(existed)
    }

    /// Best-effort drop after an analytic call; failures are only logged.
    pub async fn release(&self, handle: &ProjectionHandle) {
        if let Err(e) = self.drop_projection(handle.name()).await {
            warn!(projection = handle.name(), error = %e, "Failed to drop projection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockGraphStore, StoreOp};

    fn spec(name: &str) -> ProjectionSpec {
        ProjectionSpec::trips(name, vec!["distance".to_string()])
    }

    #[tokio::test]
    async fn test_creates_missing_projection() {
        let store = MockGraphStore::with_trips(&[(3, 18), (18, 20)]).await;
        let manager = ProjectionManager::new(&store);

        let handle = manager
            .ensure_projection(&spec("TripGraph"), EnsureMode::Reuse)
            .await
            .unwrap();

        assert!(handle.was_created());
        assert_eq!(handle.info().unwrap().node_count, 3);
        assert_eq!(handle.info().unwrap().relationship_count, 2);
        assert!(store.has_projection("TripGraph").await);
    }

    #[tokio::test]
    async fn test_reuses_existing_projection_without_recreating() {
        let store = MockGraphStore::with_trips(&[(3, 18)]).await;
        let manager = ProjectionManager::new(&store);
        manager
            .ensure_projection(&spec("TripGraph"), EnsureMode::Reuse)
            .await
            .unwrap();

        let handle = manager
            .ensure_projection(&spec("TripGraph"), EnsureMode::Reuse)
            .await
            .unwrap();

        assert!(!handle.was_created());
        assert_eq!(store.calls(StoreOp::CreateProjection).await, 1);
    }

    #[tokio::test]
    async fn test_recreate_drops_then_creates() {
        let store = MockGraphStore::with_trips(&[(3, 18)]).await;
        let manager = ProjectionManager::new(&store);
        manager
            .ensure_projection(&spec("TripGraph"), EnsureMode::Reuse)
            .await
            .unwrap();

        let handle = manager
            .ensure_projection(&spec("TripGraph"), EnsureMode::Recreate)
            .await
            .unwrap();

        assert!(handle.was_created());
        assert_eq!(store.calls(StoreOp::DropProjection).await, 1);
        assert_eq!(store.calls(StoreOp::CreateProjection).await, 2);
    }

    #[tokio::test]
    async fn test_create_failure_retries_once_after_drop() {
        let store = MockGraphStore::with_trips(&[(3, 18)]).await;
        store
            .fail_next(StoreOp::CreateProjection, GraphError::query("create_projection", "incompatible schema"))
            .await;
        let manager = ProjectionManager::new(&store);

        let handle = manager
            .ensure_projection(&spec("TripGraph"), EnsureMode::Reuse)
            .await
            .unwrap();

        assert!(handle.was_created());
        assert_eq!(store.calls(StoreOp::CreateProjection).await, 2);
        assert_eq!(store.calls(StoreOp::DropProjection).await, 1);
    }

    #[tokio::test]
    async fn test_second_create_failure_is_terminal() {
        let store = MockGraphStore::with_trips(&[(3, 18)]).await;
        for _ in 0..3 {
            store
                .fail_next(StoreOp::CreateProjection, GraphError::query("create_projection", "incompatible schema"))
                .await;
        }
        let manager = ProjectionManager::new(&store);

        let err = manager
            .ensure_projection(&spec("TripGraph"), EnsureMode::Reuse)
            .await
            .unwrap_err();

        assert!(matches!(err, GraphError::ProjectionCreateFailed { ref name, .. } if name == "TripGraph"));
        assert_eq!(store.calls(StoreOp::CreateProjection).await, 2);
    }

    #[tokio::test]
    async fn test_connection_failure_is_not_retried() {
        let store = MockGraphStore::with_trips(&[(3, 18)]).await;
        store
            .fail_next(StoreOp::CreateProjection, GraphError::unavailable("create_projection", "connection refused"))
            .await;
        let manager = ProjectionManager::new(&store);

        let err = manager
            .ensure_projection(&spec("TripGraph"), EnsureMode::Reuse)
            .await
            .unwrap_err();

        assert!(matches!(err, GraphError::StoreUnavailable { .. }));
        assert_eq!(store.calls(StoreOp::CreateProjection).await, 1);
    }

    #[tokio::test]
    async fn test_release_swallows_drop_failure() {
        let store = MockGraphStore::with_trips(&[(3, 18)]).await;
        let manager = ProjectionManager::new(&store);
        let handle = manager
            .ensure_projection(&spec("TripGraph"), EnsureMode::Reuse)
            .await
            .unwrap();
        store
            .fail_next(StoreOp::DropProjection, GraphError::query("drop_projection", "boom"))
            .await;

        manager.release(&handle).await;

        assert!(store.has_projection("TripGraph").await);
    }

    #[test]
    fn test_session_scoped_names_are_unique() {
        let a = ProjectionSpec::session_scoped("TripGraph", Vec::new());
        let b = ProjectionSpec::session_scoped("TripGraph", Vec::new());
        assert!(a.name.starts_with("TripGraph-"));
        assert_ne!(a.name, b.name);
    }
}
