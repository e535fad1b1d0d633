//! Terminal output formatting.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use tripgraph_core::NormalizeReport;
use tripgraph_graph::{GraphCounts, LoadSummary, NodeScore, PathOutcome, RankOptions, RankOutcome, ScoreMode};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print how many rows survived reading and normalization.
pub fn print_ingest(file: &Path, unreadable: usize, report: &NormalizeReport, json: bool) -> Result<()> {
    if json {
        return print_json(&json!({
            "file": file.display().to_string(),
            "kept": report.kept(),
            "filtered_out": report.filtered_out,
            "malformed": report.malformed + unreadable,
        }));
    }

    println!("{} {}", "Trip file".bold(), file.display().to_string().cyan());
    print_report_lines(unreadable, report);
    Ok(())
}

fn print_report_lines(unreadable: usize, report: &NormalizeReport) {
    println!("  {:<14} {}", "Kept", report.kept().to_string().green());
    println!("  {:<14} {}", "Filtered out", report.filtered_out.to_string().yellow());

    let malformed = report.malformed + unreadable;
    let malformed = if malformed > 0 {
        malformed.to_string().red()
    } else {
        malformed.to_string().dimmed()
    };
    println!("  {:<14} {}", "Malformed", malformed);
}

/// Print the outcome of a `load` run.
pub fn print_load(
    file: &Path,
    unreadable: usize,
    report: &NormalizeReport,
    summary: &LoadSummary,
    json: bool,
) -> Result<()> {
    if json {
        return print_json(&json!({
            "file": file.display().to_string(),
            "kept": report.kept(),
            "filtered_out": report.filtered_out,
            "malformed": report.malformed + unreadable,
            "nodes_created": summary.nodes_created,
            "edges_created": summary.edges_created,
        }));
    }

    println!("{} {}", "✓".green().bold(), "Trips loaded".bold());
    print_report_lines(unreadable, report);
    println!("  {:<14} {}", "Nodes created", summary.nodes_created.to_string().cyan());
    println!("  {:<14} {}", "Edges created", summary.edges_created.to_string().cyan());
    Ok(())
}

/// Print a shortest-path result.
pub fn print_path(start: i64, end: i64, outcome: &PathOutcome, json: bool) -> Result<()> {
    if json {
        return print_json(outcome);
    }

    match outcome {
        PathOutcome::Found(path) => {
            let arrow = format!(" {} ", "→".dimmed());
            let rendered = path
                .iter()
                .map(|zone| zone.to_string())
                .collect::<Vec<_>>()
                .join(arrow.as_str());
            println!("{} {}", "Path".bold(), rendered.cyan());
            println!("{}", format!("{} hop(s)", path.len().saturating_sub(1)).dimmed());
        }
        PathOutcome::NoPathFound => {
            println!("{}", format!("No path from {} to {}.", start, end).yellow());
        }
    }
    Ok(())
}

/// Print the highest and lowest ranked locations.
pub fn print_rank(options: &RankOptions, outcome: &RankOutcome, json: bool) -> Result<()> {
    if json {
        return print_json(outcome);
    }

    let weight = options.weight_property.as_deref().unwrap_or("none");
    let mode = match options.mode {
        ScoreMode::Stream => "stream",
        ScoreMode::Write => "write",
    };
    println!(
        "{}",
        format!(
            "PageRank: {} iteration(s) max, weight {}, {} mode",
            options.max_iterations, weight, mode
        )
        .dimmed()
    );

    match outcome {
        RankOutcome::Ranked { highest, lowest } => {
            print_score("Highest", highest);
            print_score("Lowest", lowest);
        }
        RankOutcome::Empty => println!("{}", "The graph has no locations.".dimmed()),
    }
    Ok(())
}

fn print_score(label: &str, score: &NodeScore) {
    println!(
        "  {:<8} zone {:<5} {}",
        label.bold(),
        score.id.to_string().cyan(),
        format!("{:.6}", score.score).green()
    );
}

/// Print node and relationship counts.
pub fn print_counts(uri: &str, counts: &GraphCounts, json: bool) -> Result<()> {
    if json {
        return print_json(counts);
    }

    println!("{} {}", "Neo4j".bold(), uri.dimmed());
    println!("  {:<14} {}", "Locations", counts.nodes.to_string().cyan());
    println!("  {:<14} {}", "Trips", counts.relationships.to_string().cyan());
    Ok(())
}
