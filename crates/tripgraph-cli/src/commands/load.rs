//! Trip file loading.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tripgraph_graph::{load, reset_graph, LoadSummary};

use crate::config::AppConfig;
use crate::output;

#[derive(Args)]
pub struct LoadArgs {
    /// Trip file (`.parquet`, or CSV with header)
    pub file: PathBuf,

    /// Keep the existing graph and add the trips on top of it
    #[arg(long)]
    pub append: bool,
}

pub async fn execute(args: LoadArgs, config: &AppConfig, json: bool) -> Result<()> {
    let read = tripgraph_core::read_trips(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let report = tripgraph_core::normalize(read.rows, &config.filter);
    info!(
        file = %args.file.display(),
        kept = report.kept(),
        filtered_out = report.filtered_out,
        malformed = report.malformed + read.malformed,
        "Trip file normalized"
    );

    let store = super::connect(config).await?;
    if !args.append {
        reset_graph(&store).await.context("Failed to reset the graph")?;
    }

    let progress = if json {
        ProgressBar::hidden()
    } else {
        progress_bar(report.records.len() as u64)?
    };

    let mut summary = LoadSummary::default();
    for chunk in report.records.chunks(config.load.chunk_size.max(1)) {
        let loaded = load(&store, chunk).await.with_context(|| {
            format!("Load stopped after {} of {} trips", summary.edges_created, report.kept())
        })?;
        summary.merge(&loaded);
        progress.inc(chunk.len() as u64);
    }
    progress.finish_and_clear();

    output::print_load(&args.file, read.malformed, &report, &summary, json)
}

fn progress_bar(total: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} trips ({per_sec})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
