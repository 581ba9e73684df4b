//! Scenario runner: page loads, expectations, and report aggregation

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::assertion::AssertionEngine;
use crate::config::HarnessConfig;
use crate::engine::{Engine, Page};
use crate::error::HarnessError;
use crate::navigator::Navigator;
use crate::report::{Outcome, RunReport, ScenarioResult};
use crate::scenario::Scenario;

/// Runs scenarios, each in its own browser context
pub struct ScenarioRunner {
    engine: Arc<dyn Engine>,
    navigator: Navigator,
    assertions: AssertionEngine,
    concurrency: usize,
}

/// Failure inside a scenario, with the index of the expectation that raised it
struct ScenarioFailure {
    error: HarnessError,
    expectation: Option<usize>,
}

impl From<HarnessError> for ScenarioFailure {
    fn from(error: HarnessError) -> Self {
        Self { error, expectation: None }
    }
}

impl ScenarioRunner {
    pub fn new(engine: Arc<dyn Engine>, config: &HarnessConfig) -> Self {
        Self {
            engine,
            navigator: Navigator::new(config.base_url.clone(), config.poll_interval()),
            assertions: AssertionEngine::new(config.poll_interval()),
            concurrency: config.concurrency.max(1),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Run every scenario and collect a report in submission order.
    ///
    /// Never fails: every error becomes a failed scenario result.
    pub async fn run(&self, scenarios: &[Scenario]) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            "Running {} scenario(s) against {} ({} at a time)",
            scenarios.len(),
            self.navigator.base_url(),
            self.concurrency
        );

        let results: Vec<ScenarioResult> = stream::iter(scenarios)
            .map(|scenario| self.run_scenario(scenario))
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = RunReport::new(
            self.navigator.base_url(),
            started_at,
            start.elapsed().as_millis() as u64,
            results,
        );

        info!(
            "Results: {} passed, {} failed ({} ms)",
            report.passed, report.failed, report.duration_ms
        );
        report
    }

    /// Run a single scenario in a fresh browser context
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        let mut diagnostics = Vec::new();
        debug!("Running scenario: {}", scenario.name);

        let result = match scenario.validate() {
            Err(e) => Err(ScenarioFailure::from(e)),
            Ok(()) => match self.engine.open().await {
                Err(e) => Err(ScenarioFailure::from(e)),
                Ok(mut page) => {
                    let result = self.drive(page.as_mut(), scenario, &mut diagnostics).await;
                    if let Err(e) = page.close().await {
                        warn!("[{}] Failed to close browser context: {}", scenario.name, e);
                    }
                    result
                }
            },
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let outcome = match result {
            Ok(()) => {
                info!("✓ {} ({} ms)", scenario.name, duration_ms);
                Outcome::Pass
            }
            Err(failure) => {
                error!("✗ {} - {}", scenario.name, failure.error);
                diagnostics.push(format!("failed: {}", failure.error));
                Outcome::failed(&failure.error, failure.expectation)
            }
        };

        ScenarioResult {
            scenario: scenario.name.clone(),
            target_path: scenario.target_path.clone(),
            outcome,
            diagnostics,
            duration_ms,
        }
    }

    /// Load the page, then evaluate expectations in order until one fails
    async fn drive(
        &self,
        page: &mut dyn Page,
        scenario: &Scenario,
        diagnostics: &mut Vec<String>,
    ) -> Result<(), ScenarioFailure> {
        let ready = self
            .navigator
            .load(page, &scenario.target_path, &scenario.ready)
            .await?;
        diagnostics.push(format!("ready: {} after {} ms", ready.url, ready.elapsed_ms));

        for (index, expectation) in scenario.expectations.iter().enumerate() {
            match self.assertions.evaluate(expectation, page).await {
                Ok(observation) => {
                    info!("[{}] {}", scenario.name, observation);
                    diagnostics.push(observation.to_string());
                }
                Err(error) => {
                    return Err(ScenarioFailure {
                        error,
                        expectation: Some(index),
                    })
                }
            }
        }
        Ok(())
    }
}
