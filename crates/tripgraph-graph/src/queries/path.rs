//! Breadth-first path search between two locations.
//!
//! The store runs GDS BFS and hands back the visit order plus the edges among
//! visited nodes. The path is rebuilt from that trace: a node's parent is its
//! predecessor that was visited first, which is exactly the node BFS
//! discovered it from. Hop count decides, edge weights are ignored.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;
use tripgraph_core::ZoneId;

use crate::error::GraphResult;
use crate::projection::ProjectionHandle;
use crate::store::{BfsTrace, GraphStore};

/// Result of a path search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "path", rename_all = "snake_case")]
pub enum PathOutcome {
    /// Zone ids from start to end, both inclusive.
    Found(Vec<ZoneId>),
    NoPathFound,
}

impl PathOutcome {
    pub fn path(&self) -> Option<&[ZoneId]> {
        match self {
            Self::Found(path) => Some(path),
            Self::NoPathFound => None,
        }
    }

    /// Number of trips along the path.
    pub fn hops(&self) -> Option<usize> {
        self.path().map(|path| path.len().saturating_sub(1))
    }
}

/// Find one hop-count shortest path from `start` to `end` over `projection`.
pub async fn shortest_path<S: GraphStore + ?Sized>(
    store: &S,
    projection: &ProjectionHandle,
    start: ZoneId,
    end: ZoneId,
) -> GraphResult<PathOutcome> {
    let trace = match store.bfs_trace(projection, start, end).await? {
        Some(trace) => trace,
        None => {
            debug!(start, end, "Start or end location not in projection");
            return Ok(PathOutcome::NoPathFound);
        }
    };

    Ok(match reconstruct_path(&trace, start, end) {
        Some(path) => PathOutcome::Found(path),
        None => PathOutcome::NoPathFound,
    })
}

/// Rebuild the start-to-end path from a BFS trace.
pub fn reconstruct_path(trace: &BfsTrace, start: ZoneId, end: ZoneId) -> Option<Vec<ZoneId>> {
    if trace.visited.first() != Some(&start) {
        return None;
    }

    let order: HashMap<ZoneId, usize> = trace
        .visited
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index))
        .collect();
    if !order.contains_key(&end) {
        return None;
    }

    // parent[v] = predecessor of v with the smallest visit index
    let mut parent: HashMap<ZoneId, ZoneId> = HashMap::new();
    for (source, target) in &trace.edges {
        let (Some(&s), Some(&t)) = (order.get(source), order.get(target)) else {
            continue;
        };
        if s >= t {
            continue;
        }
        parent
            .entry(*target)
            .and_modify(|current| {
                if s < order[&*current] {
                    *current = *source;
                }
            })
            .or_insert(*source);
    }

    let mut path = vec![end];
    let mut current = end;
    while current != start {
        current = *parent.get(&current)?;
        path.push(current);
    }
    path.reverse();
    Some(path)
}
