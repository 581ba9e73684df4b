//! Run Command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use sitecheck_harness::config::BASE_URL_ENV;
use sitecheck_harness::playwright::{Browser, PlaywrightEngine};
use sitecheck_harness::{HarnessConfig, ScenarioRunner};

use super::Selection;
use crate::output::{self, OutputFormat};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Scenarios running at once
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long)]
    pub browser: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Directory for the JSON report
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Site origin scenario paths are resolved against
    #[arg(long, env = "PAGE_URL")]
    pub base_url: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Resolve configuration: file (or defaults), then flags, then base URL
    pub fn resolve_config(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => HarnessConfig::default(),
        };

        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(browser) = &self.browser {
            config.playwright.browser = browser.parse::<Browser>()?;
        }
        if self.headed {
            config.playwright.headless = false;
        }
        if let Some(dir) = &self.output {
            config.output_dir = dir.clone();
        }

        // clap already folded the environment variable into `base_url`
        let base_url = self.base_url.clone();
        Ok(config.with_env(|key| if key == BASE_URL_ENV { base_url.clone() } else { None })?)
    }
}

pub async fn execute(args: RunArgs, format: OutputFormat) -> Result<i32> {
    let config = args.resolve_config()?;
    let scenarios = args.selection.load()?;

    if scenarios.is_empty() {
        output::print_warning("No scenarios matched the selection");
        return Ok(0);
    }

    let engine = PlaywrightEngine::new(config.playwright.clone())?;
    let runner = ScenarioRunner::new(Arc::new(engine), &config);
    let report = runner.run(&scenarios).await;

    output::print_report(&report, format);

    let path = report
        .write_json(&config.output_dir)
        .with_context(|| format!("Failed to write report to {}", config.output_dir.display()))?;
    info!("Report: {}", path.display());

    Ok(report.exit_code())
}
