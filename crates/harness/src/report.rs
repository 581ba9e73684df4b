//! Scenario results and run reports

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FailureKind, HarnessError, HarnessResult};

/// File name of the JSON report inside the output directory
pub const REPORT_FILE: &str = "sitecheck-report.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail {
        kind: FailureKind,
        reason: String,
        /// Zero-based index of the failing expectation, if one failed
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expectation: Option<usize>,
    },
}

impl Outcome {
    pub fn failed(error: &HarnessError, expectation: Option<usize>) -> Self {
        Outcome::Fail {
            kind: error.kind(),
            reason: error.to_string(),
            expectation,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub target_path: String,
    pub outcome: Outcome,
    pub diagnostics: Vec<String>,
    pub duration_ms: u64,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.outcome.is_pass()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Pass => None,
            Outcome::Fail { reason, .. } => Some(reason),
        }
    }
}

/// Result of running a batch of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub base_url: String,
    pub duration_ms: u64,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<ScenarioResult>,
}

impl RunReport {
    pub fn new(
        base_url: impl Into<String>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        results: Vec<ScenarioResult>,
    ) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        Self {
            started_at,
            base_url: base_url.into(),
            duration_ms,
            total: results.len(),
            passed,
            failed: results.len() - passed,
            results,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit status for this report
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results.iter().filter(|r| !r.passed())
    }

    /// Write the report as pretty JSON into `output_dir`
    pub fn write_json(&self, output_dir: &Path) -> HarnessResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Report written to: {}", path.display());
        Ok(path)
    }

    pub fn read_json(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, outcome: Outcome) -> ScenarioResult {
        ScenarioResult {
            scenario: name.to_string(),
            target_path: "/".to_string(),
            outcome,
            diagnostics: vec![],
            duration_ms: 1,
        }
    }

    #[test]
    fn test_counts_and_exit_code() {
        let err = HarnessError::EnvironmentError {
            flag: "mermaid".into(),
            reason: "not defined".into(),
        };
        let report = RunReport::new(
            "http://localhost",
            Utc::now(),
            10,
            vec![
                result("a", Outcome::Pass),
                result("b", Outcome::failed(&err, Some(0))),
                result("c", Outcome::Pass),
            ],
        );
        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failures().next().unwrap().scenario, "b");
    }

    #[test]
    fn test_empty_report_succeeds() {
        let report = RunReport::new("http://localhost", Utc::now(), 0, vec![]);
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_json_written_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let err = HarnessError::VisibilityTimeout {
            selector: "h1".into(),
            timeout_ms: 15000,
        };
        let report = RunReport::new(
            "http://localhost",
            Utc::now(),
            5,
            vec![result("slow", Outcome::failed(&err, Some(2)))],
        );

        let path = report.write_json(&dir.path().join("nested")).unwrap();
        assert!(path.ends_with(REPORT_FILE));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["results"][0]["outcome"]["status"], "fail");
        assert_eq!(json["results"][0]["outcome"]["kind"], "visibility_timeout");

        let back = RunReport::read_json(&path).unwrap();
        assert_eq!(back.results[0].outcome, report.results[0].outcome);
    }
}
