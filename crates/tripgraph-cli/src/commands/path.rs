//! Shortest path between two zones.

use anyhow::Result;
use clap::Args;
use tripgraph_graph::TripAnalytics;

use crate::config::AppConfig;
use crate::output;

#[derive(Args)]
pub struct PathArgs {
    /// Start zone id
    pub start: i64,
    /// Target zone id
    pub end: i64,
}

pub async fn execute(args: PathArgs, config: &AppConfig, json: bool) -> Result<()> {
    let store = super::connect(config).await?;
    let analytics = TripAnalytics::new(&store, config.analytics.clone());

    let outcome = analytics.shortest_path(args.start, args.end).await?;
    output::print_path(args.start, args.end, &outcome, json)
}
