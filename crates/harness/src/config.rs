//! Harness configuration
//!
//! Resolved once at startup and passed down by value. Components never read
//! the environment themselves.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HarnessError, HarnessResult};
use crate::playwright::PlaywrightConfig;

/// Environment variable overriding the site origin
pub const BASE_URL_ENV: &str = "PAGE_URL";

/// Published site checked when nothing overrides it
pub const DEFAULT_BASE_URL: &str = "https://maugx3.github.io/ai-tools";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Origin every scenario path is resolved against
    pub base_url: String,

    /// Scenarios running at once, each in its own browser context
    pub concurrency: usize,

    /// Interval between ready/visibility polls
    pub poll_interval_ms: u64,

    /// Where the JSON report is written
    pub output_dir: PathBuf,

    pub playwright: PlaywrightConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: 4,
            poll_interval_ms: 100,
            output_dir: PathBuf::from("test-results"),
            playwright: PlaywrightConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Defaults with the base URL taken from the process environment
    pub fn from_env() -> HarnessResult<Self> {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> HarnessResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BASE_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.base_url = url.to_string();
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist
    pub fn load(path: &Path) -> HarnessResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> HarnessResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if !(self.base_url.starts_with("http://")
            || self.base_url.starts_with("https://")
            || self.base_url.starts_with("file://"))
        {
            return Err(HarnessError::Config(format!(
                "base URL '{}' must be an http(s) or file URL",
                self.base_url
            )));
        }
        if self.concurrency == 0 {
            return Err(HarnessError::Config("concurrency must be at least 1".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(HarnessError::Config("poll interval must be at least 1 ms".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
