//! PageRank over the trip graph.

use anyhow::Result;
use clap::Args;
use tripgraph_graph::{RankOptions, ScoreMode, TripAnalytics};

use crate::config::AppConfig;
use crate::output;

#[derive(Args)]
pub struct RankArgs {
    /// Maximum PageRank iterations (defaults to the configured value)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_iterations: Option<u32>,

    /// Trip property to use as edge weight (e.g. distance, fare)
    #[arg(long)]
    pub weight: Option<String>,

    /// Write scores to the nodes and read them back instead of streaming
    #[arg(long)]
    pub write_mode: bool,
}

pub async fn execute(args: RankArgs, config: &AppConfig, json: bool) -> Result<()> {
    let store = super::connect(config).await?;
    let analytics = TripAnalytics::new(&store, config.analytics.clone());

    let mode = if args.write_mode {
        ScoreMode::Write
    } else {
        config.analytics.score_mode
    };
    let mut options =
        RankOptions::new(args.max_iterations.unwrap_or(config.analytics.max_iterations)).mode(mode);
    if let Some(weight) = &args.weight {
        options = options.weighted_by(weight.as_str());
    }

    let outcome = analytics.rank_with(&options).await?;
    output::print_rank(&options, &outcome, json)
}
