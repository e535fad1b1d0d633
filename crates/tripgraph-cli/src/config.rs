//! Configuration file loading.
//!
//! ```toml
//! [graph]
//! uri = "bolt://localhost:7687"
//! user = "neo4j"
//!
//! [filter]
//! min_fare = 2.5
//!
//! [analytics]
//! max_iterations = 20
//! score_mode = "stream"
//!
//! [load]
//! chunk_size = 1000
//! ```
//!
//! Every section and key is optional.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tripgraph_core::FilterPolicy;
use tripgraph_graph::{AnalyticsSettings, GraphConfig};

/// Settings for the `load` command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadSettings {
    /// Trips written between progress updates.
    pub chunk_size: usize,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self { chunk_size: 1000 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub graph: GraphConfig,
    pub filter: FilterPolicy,
    pub analytics: AnalyticsSettings,
    pub load: LoadSettings,
}

impl AppConfig {
    /// Read the config file at `path`, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::parse(&text)
                    .with_context(|| format!("Invalid config file {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
