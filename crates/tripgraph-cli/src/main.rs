//! tripgraph CLI
//!
//! Loads taxi trip files into Neo4j and runs path and centrality queries.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

use commands::Cli;

/// Initialize tracing on stderr so `--json` output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "tripgraph=debug,tripgraph_graph=debug,tripgraph_core=debug"
    } else {
        "tripgraph=info,tripgraph_graph=info,tripgraph_core=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.execute().await
}
