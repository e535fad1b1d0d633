//! One-call analytics: project, run, drop.
//!
//! Every call works on its own projection and drops it before returning,
//! whatever the outcome. A failed drop is logged and never replaces the
//! call's own result or error.
//!
//! GDS refuses to project a relationship type the database has never seen,
//! so on a graph with no nodes at all nothing is projected: paths come back
//! as [`PathOutcome::NoPathFound`] and rankings as [`RankOutcome::Empty`].

use serde::Deserialize;
use tracing::{info, warn};
use tripgraph_core::ZoneId;

use crate::error::GraphResult;
use crate::projection::{EnsureMode, ProjectionHandle, ProjectionManager};
use crate::queries::centrality::{self, RankOptions, RankOutcome, ScoreMode};
use crate::queries::path::{self, PathOutcome};
use crate::store::{GraphStore, ProjectionSpec};

/// Projection naming and defaults for analytic calls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    pub projection_name: String,
    /// Suffix the projection name per call so concurrent sessions never collide.
    pub session_scoped: bool,
    /// Rebuild a same-named projection instead of reusing a possibly stale one.
    pub recreate_existing: bool,
    pub max_iterations: u32,
    pub score_mode: ScoreMode,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            projection_name: "TripGraph".to_string(),
            session_scoped: true,
            recreate_existing: true,
            max_iterations: 20,
            score_mode: ScoreMode::Stream,
        }
    }
}

/// Path and ranking queries with managed projections.
pub struct TripAnalytics<'a, S: ?Sized> {
    store: &'a S,
    settings: AnalyticsSettings,
}

impl<'a, S: GraphStore + ?Sized> TripAnalytics<'a, S> {
    pub fn new(store: &'a S, settings: AnalyticsSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    /// Hop-count shortest path from `start` to `end`.
    pub async fn shortest_path(&self, start: ZoneId, end: ZoneId) -> GraphResult<PathOutcome> {
        if self.graph_is_empty().await? {
            return Ok(PathOutcome::NoPathFound);
        }

        let spec = self.projection_spec(Vec::new());
        let manager = ProjectionManager::new(self.store);
        let handle = self.acquire(&manager, &spec).await?;

        let outcome = path::shortest_path(self.store, &handle, start, end).await;
        manager.release(&handle).await;

        if let Ok(found) = &outcome {
            info!(start, end, hops = ?found.hops(), "Path query finished");
        }
        outcome
    }

    /// Rank locations by PageRank using the configured iteration count and mode.
    pub async fn rank(&self, weight_property: Option<&str>) -> GraphResult<RankOutcome> {
        let mut options =
            RankOptions::new(self.settings.max_iterations).mode(self.settings.score_mode);
        if let Some(weight) = weight_property {
            options = options.weighted_by(weight);
        }
        self.rank_with(&options).await
    }

    /// Rank locations with explicit options.
    pub async fn rank_with(&self, options: &RankOptions) -> GraphResult<RankOutcome> {
        if options.max_iterations > 0 && self.graph_is_empty().await? {
            return Ok(RankOutcome::Empty);
        }

        let spec = self.projection_spec(options.weight_property.iter().cloned().collect());
        let manager = ProjectionManager::new(self.store);
        let handle = self.acquire(&manager, &spec).await?;

        let outcome = centrality::rank(self.store, &handle, options).await;
        manager.release(&handle).await;
        outcome
    }

    async fn graph_is_empty(&self) -> GraphResult<bool> {
        let counts = self.store.counts().await?;
        if counts.nodes == 0 {
            info!("Graph is empty, skipping projection");
        }
        Ok(counts.nodes == 0)
    }

    fn projection_spec(&self, edge_properties: Vec<String>) -> ProjectionSpec {
        if self.settings.session_scoped {
            ProjectionSpec::session_scoped(&self.settings.projection_name, edge_properties)
        } else {
            ProjectionSpec::trips(self.settings.projection_name.clone(), edge_properties)
        }
    }

    /// Ensure the projection; if that fails, try to drop whatever was left behind.
    async fn acquire(
        &self,
        manager: &ProjectionManager<'_, S>,
        spec: &ProjectionSpec,
    ) -> GraphResult<ProjectionHandle> {
        let mode = if self.settings.recreate_existing {
            EnsureMode::Recreate
        } else {
            EnsureMode::Reuse
        };

        match manager.ensure_projection(spec, mode).await {
            Ok(handle) => Ok(handle),
            Err(e) => {
                if let Err(drop_err) = manager.drop_projection(&spec.name).await {
                    warn!(projection = %spec.name, error = %drop_err, "Cleanup after failed projection create failed");
                }
                Err(e)
            }
        }
    }
}
