//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use sitecheck_harness::{RunReport, ScenarioResult};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TableDisplay for ScenarioResult {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Path", "Status", "Duration", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        let status = if self.passed() {
            "✓ pass".green().to_string()
        } else {
            "✗ fail".red().to_string()
        };
        vec![
            self.scenario.clone(),
            self.target_path.clone(),
            status,
            format!("{}ms", self.duration_ms),
            self.failure_reason().unwrap_or_default().to_string(),
        ]
    }
}

fn table<T: TableDisplay>(items: &[T]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(T::headers());
    for item in items {
        table.add_row(item.row());
    }
    table
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No items found.");
                return;
            }
            println!("{}", table(items));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
    }
}

/// Print a run report with a one-line summary
pub fn print_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{}", table(&report.results));
            println!();

            let summary = format!(
                "{} passed, {} failed of {} ({} ms)",
                report.passed, report.failed, report.total, report.duration_ms
            );
            if report.is_success() {
                print_success(&summary);
            } else {
                print_error(&summary);
                for failure in report.failures() {
                    if let Some(reason) = failure.failure_reason() {
                        println!("  {} {}: {}", "✗".red(), failure.scenario.bold(), reason);
                    }
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("⚠️  {}", message);
}
