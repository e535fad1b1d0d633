//! CLI command definitions and handlers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tripgraph_graph::Neo4jStore;

use crate::config::AppConfig;

pub mod inspect;
pub mod load;
pub mod path;
pub mod rank;
pub mod status;

/// Taxi trip graph loader and analytics
#[derive(Parser)]
#[command(name = "tripgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "TRIPGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Neo4j bolt URI (overrides the config file)
    #[arg(long, global = true, env = "NEO4J_URI")]
    pub uri: Option<String>,

    /// Neo4j user (overrides the config file)
    #[arg(long, global = true, env = "NEO4J_USER")]
    pub user: Option<String>,

    /// Neo4j password (overrides the config file)
    #[arg(long, global = true, env = "NEO4J_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read and normalize a trip file without touching the database
    Inspect(inspect::InspectArgs),

    /// Load a trip file into the graph (replaces existing data unless --append)
    Load(load::LoadArgs),

    /// Shortest path (by number of trips) between two zones
    Path(path::PathArgs),

    /// Highest and lowest PageRank zones
    Rank(rank::RankArgs),

    /// Show node and relationship counts
    Status,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.resolve_config()?;
        let json = self.json;

        match self.command {
            Commands::Inspect(args) => inspect::execute(args, &config, json),
            Commands::Load(args) => load::execute(args, &config, json).await,
            Commands::Path(args) => path::execute(args, &config, json).await,
            Commands::Rank(args) => rank::execute(args, &config, json).await,
            Commands::Status => status::execute(&config, json).await,
        }
    }

    /// Config file values with connection flags applied on top.
    fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(uri) = &self.uri {
            config.graph.uri = uri.clone();
        }
        if let Some(user) = &self.user {
            config.graph.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.graph.password = password.clone();
        }
        Ok(config)
    }
}

/// Connect to Neo4j, waiting for it to come up.
pub async fn connect(config: &AppConfig) -> Result<Neo4jStore> {
    Neo4jStore::connect_with_retry(&config.graph)
        .await
        .with_context(|| format!("Failed to connect to Neo4j at {}", config.graph.uri))
}
