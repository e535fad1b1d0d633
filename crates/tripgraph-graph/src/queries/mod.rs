//! Analytic queries over a GDS projection.

pub mod centrality;
pub mod path;
