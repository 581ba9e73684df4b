//! Declarative scenario definitions
//!
//! A scenario is one page load followed by an ordered list of expectations.
//! Scenarios are plain data: they can be built in code (see
//! [`crate::suite`]) or parsed from YAML files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HarnessError, HarnessResult};
use crate::selector::Selector;

/// A complete scenario definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Path relative to the configured base URL
    pub target_path: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Condition the page must reach before any expectation runs
    #[serde(default)]
    pub ready: ReadyCondition,

    /// Expectations evaluated in order after the page is ready
    #[serde(default)]
    pub expectations: Vec<Expectation>,
}

/// When a loaded page is considered safe to assert against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyCondition {
    /// Element that must be present and laid out
    #[serde(default = "default_heading")]
    pub heading: Selector,

    /// Also wait for network quiescence (pages rendering diagrams after load)
    #[serde(default)]
    pub network_idle: bool,

    /// Overrides the default ready timeout
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Ready timeout for pages with client-side rendering
pub const RENDERING_READY_TIMEOUT_MS: u64 = 15_000;

/// Ready timeout for everything else
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 10_000;

fn default_heading() -> Selector {
    Selector::literal("h1")
}

impl Default for ReadyCondition {
    fn default() -> Self {
        Self {
            heading: default_heading(),
            network_idle: false,
            timeout_ms: None,
        }
    }
}

impl ReadyCondition {
    pub fn effective_timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(if self.network_idle {
            RENDERING_READY_TIMEOUT_MS
        } else {
            DEFAULT_READY_TIMEOUT_MS
        })
    }
}

/// A single read-only check against the rendered page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expect", rename_all = "snake_case")]
pub enum Expectation {
    /// Number of matching elements lies within `min..=max`
    ElementCount {
        selector: Selector,
        #[serde(default)]
        min: usize,
        #[serde(default)]
        max: Option<usize>,
    },

    /// A matching element is present with a non-zero box. With `first`,
    /// only the first match counts.
    Visible {
        selector: Selector,
        #[serde(default = "default_visible_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        first: bool,
    },

    /// First matching element is laid out at least this large
    BoundingBoxAtLeast {
        selector: Selector,
        min_width: f64,
        min_height: f64,
    },

    /// Serialized page content does not contain `pattern` literally
    TextAbsent { pattern: String },

    /// Named global in the page is defined and truthy
    GlobalFlagTrue { flag: String },

    /// Document title matches a regular expression
    TitleMatches { pattern: String },

    /// Current URL matches a regular expression
    UrlMatches { pattern: String },

    /// First matching link points at an href matching a regular expression
    LinkTarget {
        selector: Selector,
        href_pattern: String,
        #[serde(default)]
        optional: bool,
    },
}

fn default_visible_timeout() -> u64 {
    5000
}

impl Expectation {
    /// Short label used in logs and diagnostics
    pub fn label(&self) -> String {
        match self {
            Expectation::ElementCount { selector, .. } => format!("count:{}", selector),
            Expectation::Visible { selector, first: true, .. } => format!("visible:first:{}", selector),
            Expectation::Visible { selector, .. } => format!("visible:{}", selector),
            Expectation::BoundingBoxAtLeast { selector, .. } => format!("box:{}", selector),
            Expectation::TextAbsent { pattern } => format!("absent:{}", pattern),
            Expectation::GlobalFlagTrue { flag } => format!("flag:{}", flag),
            Expectation::TitleMatches { pattern } => format!("title:{}", pattern),
            Expectation::UrlMatches { pattern } => format!("url:{}", pattern),
            Expectation::LinkTarget { selector, .. } => format!("link:{}", selector),
        }
    }

    fn patterns(&self) -> Vec<&str> {
        match self {
            Expectation::TitleMatches { pattern } | Expectation::UrlMatches { pattern } => {
                vec![pattern.as_str()]
            }
            Expectation::LinkTarget { href_pattern, .. } => vec![href_pattern.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn count_at_least(selector: Selector, min: usize) -> Self {
        Expectation::ElementCount { selector, min, max: None }
    }

    pub fn visible(selector: Selector, timeout_ms: u64) -> Self {
        Expectation::Visible { selector, timeout_ms, first: false }
    }

    /// The first match itself must become visible
    pub fn first_visible(selector: Selector, timeout_ms: u64) -> Self {
        Expectation::Visible { selector, timeout_ms, first: true }
    }

    pub fn text_absent(pattern: impl Into<String>) -> Self {
        Expectation::TextAbsent { pattern: pattern.into() }
    }

    pub fn global_flag(flag: impl Into<String>) -> Self {
        Expectation::GlobalFlagTrue { flag: flag.into() }
    }
}

impl Scenario {
    pub fn new(name: impl Into<String>, target_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_path: target_path.into(),
            description: String::new(),
            tags: Vec::new(),
            ready: ReadyCondition::default(),
            expectations: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Require network quiescence before asserting
    pub fn wait_for_network_idle(mut self) -> Self {
        self.ready.network_idle = true;
        self
    }

    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    /// Check the scenario is runnable
    pub fn validate(&self) -> HarnessResult<()> {
        let invalid = |reason: String| HarnessError::InvalidScenario {
            name: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        if !self.target_path.starts_with('/') {
            return Err(invalid(format!(
                "target path '{}' must start with '/'",
                self.target_path
            )));
        }
        for expectation in &self.expectations {
            if let Expectation::TextAbsent { pattern } = expectation {
                if pattern.is_empty() {
                    return Err(invalid("text_absent pattern must not be empty".to_string()));
                }
            }
            if let Expectation::ElementCount { min, max: Some(max), .. } = expectation {
                if max < min {
                    return Err(invalid(format!(
                        "{}: max {} is below min {}",
                        expectation.label(),
                        max,
                        min
                    )));
                }
            }
            for pattern in expectation.patterns() {
                regex::Regex::new(pattern)
                    .map_err(|e| invalid(format!("{}: {}", expectation.label(), e)))?;
            }
        }
        Ok(())
    }

    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all scenarios from a directory, sorted by file path
    pub fn load_all(dir: &Path) -> HarnessResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }
}
