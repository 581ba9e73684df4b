//! sitecheck page verification harness
//!
//! Loads pages of a rendered documentation site in isolated browser
//! contexts, waits for client-side rendering to settle, and checks the
//! resulting DOM against declarative expectations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ScenarioRunner                                              │
//! │    ├── Engine::open() -> Box<dyn Page>   (one per scenario) │
//! │    ├── Navigator::load(page, path, ready) -> ReadyHandle    │
//! │    ├── AssertionEngine::evaluate(expectation, page)         │
//! │    └── RunReport (submission order)                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (code or YAML)                                     │
//! │    ├── name, target_path, tags                               │
//! │    ├── ready { heading, network_idle, timeout_ms }          │
//! │    └── expectations: [Expectation]                          │
//! │          ├── element_count { selector, min, max? }          │
//! │          ├── visible { selector, timeout_ms }               │
//! │          ├── bounding_box_at_least { selector, w, h }       │
//! │          ├── text_absent { pattern }                        │
//! │          ├── global_flag_true { flag }                      │
//! │          └── title_matches | url_matches | link_target      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod assertion;
pub mod config;
pub mod engine;
pub mod error;
pub mod navigator;
pub mod playwright;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod selector;
pub mod suite;
pub mod wait;

pub use assertion::{AssertionEngine, AssertionOutcome, Observation};
pub use config::HarnessConfig;
pub use engine::{BoundingBox, ElementHandle, Engine, Page};
pub use error::{FailureKind, HarnessError, HarnessResult};
pub use navigator::{Navigator, ReadyHandle};
pub use report::{Outcome, RunReport, ScenarioResult};
pub use runner::ScenarioRunner;
pub use scenario::{Expectation, ReadyCondition, Scenario};
pub use selector::Selector;
