//! PageRank centrality over a projection.
//!
//! Scores are streamed by default so nothing touches the persisted graph.
//! [`ScoreMode::Write`] writes to a uniquely named node property, reads it
//! back and removes it again on every path out.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GraphError, GraphResult};
use crate::projection::ProjectionHandle;
use crate::store::{GraphStore, NodeScore, PageRankParams, DAMPING_FACTOR};

/// How scores are obtained from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    #[default]
    Stream,
    Write,
}

/// Parameters for a ranking run.
#[derive(Debug, Clone, PartialEq)]
pub struct RankOptions {
    pub max_iterations: u32,
    /// Relationship property used as weight; must be materialized in the projection.
    pub weight_property: Option<String>,
    pub mode: ScoreMode,
}

impl RankOptions {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations,
            weight_property: None,
            mode: ScoreMode::default(),
        }
    }

    pub fn weighted_by(mut self, property: impl Into<String>) -> Self {
        self.weight_property = Some(property.into());
        self
    }

    pub fn mode(mut self, mode: ScoreMode) -> Self {
        self.mode = mode;
        self
    }

    fn params(&self) -> PageRankParams {
        PageRankParams {
            max_iterations: self.max_iterations,
            damping_factor: DAMPING_FACTOR,
            weight_property: self.weight_property.clone(),
        }
    }
}

/// Result of a ranking run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RankOutcome {
    Ranked { highest: NodeScore, lowest: NodeScore },
    /// The projection has no nodes.
    Empty,
}

/// Rank the nodes of `projection` and return the highest and lowest scorers.
pub async fn rank<S: GraphStore + ?Sized>(
    store: &S,
    projection: &ProjectionHandle,
    options: &RankOptions,
) -> GraphResult<RankOutcome> {
    if options.max_iterations == 0 {
        return Err(GraphError::InvalidArgument(
            "max_iterations must be at least 1".to_string(),
        ));
    }
    if let Some(weight) = &options.weight_property {
        if !projection.edge_properties().contains(weight) {
            return Err(GraphError::InvalidArgument(format!(
                "weight property '{}' is not materialized in projection '{}'",
                weight,
                projection.name()
            )));
        }
    }
    if projection.is_known_empty() {
        return Ok(RankOutcome::Empty);
    }

    let params = options.params();
    let scores = match options.mode {
        ScoreMode::Stream => store.page_rank_stream(projection, &params).await?,
        ScoreMode::Write => scores_via_write(store, projection, &params).await?,
    };
    debug!(projection = projection.name(), nodes = scores.len(), "PageRank finished");

    Ok(match extremes(&scores) {
        Some((highest, lowest)) => RankOutcome::Ranked { highest, lowest },
        None => RankOutcome::Empty,
    })
}

/// Write-mode scoring. The transient property is removed whatever happens;
/// a removal failure only replaces the result when the run itself succeeded.
async fn scores_via_write<S: GraphStore + ?Sized>(
    store: &S,
    projection: &ProjectionHandle,
    params: &PageRankParams,
) -> GraphResult<Vec<NodeScore>> {
    let property = format!("pagerank_{}", uuid::Uuid::new_v4().simple());
    let label = projection.node_label();

    let result: GraphResult<Vec<NodeScore>> = async {
        store.page_rank_write(projection, params, &property).await?;
        store.read_node_scores(label, &property).await
    }
    .await;
    let cleanup = store.remove_node_property(label, &property).await;

    match (result, cleanup) {
        (Ok(scores), Ok(_)) => Ok(scores),
        (Ok(_), Err(e)) => Err(GraphError::Cleanup {
            operation: "remove_node_property".to_string(),
            reason: format!("transient property '{}' may remain: {}", property, e),
        }),
        (Err(e), Ok(_)) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            warn!(property = %property, error = %cleanup_err, "Failed to remove transient score property");
            Err(e)
        }
    }
}

/// Highest and lowest scoring nodes; equal scores go to the smaller id.
pub fn extremes(scores: &[NodeScore]) -> Option<(NodeScore, NodeScore)> {
    let highest = scores
        .iter()
        .min_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)))?;
    let lowest = scores
        .iter()
        .min_by(|a, b| a.score.total_cmp(&b.score).then(a.id.cmp(&b.id)))?;
    Some((*highest, *lowest))
}
