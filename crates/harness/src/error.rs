//! Error types for page verification

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Page {path} not ready after {timeout_ms} ms")]
    NavigationTimeout { path: String, timeout_ms: u64 },

    #[error("No element matching {selector} became visible within {timeout_ms} ms")]
    VisibilityTimeout { selector: String, timeout_ms: u64 },

    #[error("{expectation}: {actual}, expected {expected}")]
    AssertionMismatch {
        expectation: String,
        expected: String,
        actual: String,
    },

    #[error("Global flag '{flag}' is {reason}")]
    EnvironmentError { flag: String, reason: String },

    #[error("Browser engine error: {0}")]
    Engine(String),

    #[error("Browser engine timed out: {0}")]
    EngineTimeout(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid scenario '{name}': {reason}")]
    InvalidScenario { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Failure category recorded in a scenario result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NavigationTimeout,
    VisibilityTimeout,
    AssertionMismatch,
    EnvironmentError,
    EngineError,
    InvalidScenario,
}

impl HarnessError {
    pub fn kind(&self) -> FailureKind {
        match self {
            HarnessError::NavigationTimeout { .. } => FailureKind::NavigationTimeout,
            HarnessError::VisibilityTimeout { .. } => FailureKind::VisibilityTimeout,
            HarnessError::AssertionMismatch { .. } => FailureKind::AssertionMismatch,
            HarnessError::EnvironmentError { .. } => FailureKind::EnvironmentError,
            HarnessError::InvalidScenario { .. } | HarnessError::InvalidSelector(_) => {
                FailureKind::InvalidScenario
            }
            _ => FailureKind::EngineError,
        }
    }

    pub(crate) fn mismatch(
        expectation: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        HarnessError::AssertionMismatch {
            expectation: expectation.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
