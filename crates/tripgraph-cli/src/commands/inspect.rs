//! Dry-run normalization of a trip file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::AppConfig;
use crate::output;

#[derive(Args)]
pub struct InspectArgs {
    /// Trip file (`.parquet`, or CSV with header)
    pub file: PathBuf,
}

pub fn execute(args: InspectArgs, config: &AppConfig, json: bool) -> Result<()> {
    let read = tripgraph_core::read_trips(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let report = tripgraph_core::normalize(read.rows, &config.filter);

    output::print_ingest(&args.file, read.malformed, &report, json)
}
