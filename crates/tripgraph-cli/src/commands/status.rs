//! Graph status.

use anyhow::Result;
use tripgraph_graph::GraphStore;

use crate::config::AppConfig;
use crate::output;

pub async fn execute(config: &AppConfig, json: bool) -> Result<()> {
    let store = super::connect(config).await?;
    let counts = store.counts().await?;
    output::print_counts(&config.graph.uri, &counts, json)
}
