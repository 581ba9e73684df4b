//! List Command

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use sitecheck_harness::Scenario;

use super::Selection;
use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub selection: Selection,
}

/// Scenario summary for listing
#[derive(Serialize)]
pub struct ScenarioDisplay {
    pub name: String,
    pub target_path: String,
    pub tags: Vec<String>,
    pub expectations: usize,
    pub description: String,
}

impl From<&Scenario> for ScenarioDisplay {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            target_path: scenario.target_path.clone(),
            tags: scenario.tags.clone(),
            expectations: scenario.expectations.len(),
            description: scenario.description.clone(),
        }
    }
}

impl TableDisplay for ScenarioDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Path", "Tags", "Checks", "Description"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.target_path.clone(),
            self.tags.join(", "),
            self.expectations.to_string(),
            self.description.clone(),
        ]
    }
}

pub fn execute(args: ListArgs, format: OutputFormat) -> Result<()> {
    let scenarios = args.selection.load()?;
    let items: Vec<ScenarioDisplay> = scenarios.iter().map(ScenarioDisplay::from).collect();
    print_list(&items, format);
    Ok(())
}
