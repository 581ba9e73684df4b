//! CLI Commands

pub mod list;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use sitecheck_harness::{suite, Scenario};

/// Which scenarios a command operates on
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Directory of YAML scenarios (defaults to the built-in suite)
    #[arg(long)]
    pub specs: Option<PathBuf>,

    /// Only scenarios carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Only scenarios whose name contains this text
    #[arg(short, long)]
    pub name: Option<String>,
}

impl Selection {
    /// Load and filter scenarios, preserving their order
    pub fn load(&self) -> Result<Vec<Scenario>> {
        let scenarios = match &self.specs {
            Some(dir) => {
                if !dir.is_dir() {
                    anyhow::bail!("Scenario directory not found: {}", dir.display());
                }
                Scenario::load_all(dir)
                    .with_context(|| format!("Failed to load scenarios from {}", dir.display()))?
            }
            None => suite::builtin(),
        };
        debug!("Loaded {} scenario(s)", scenarios.len());

        Ok(scenarios
            .into_iter()
            .filter(|s| self.tag.as_ref().map_or(true, |t| s.tags.contains(t)))
            .filter(|s| self.name.as_ref().map_or(true, |n| s.name.contains(n.as_str())))
            .collect())
    }
}
