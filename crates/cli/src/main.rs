//! sitecheck CLI - Main Entry Point
//!
//! Runs page verification scenarios against a rendered documentation site
//! and reports which pages failed to render as expected.

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{list, run};

/// sitecheck - browser-driven checks for static documentation sites
#[derive(Parser)]
#[command(name = "sitecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios and write a report
    Run(run::RunArgs),

    /// List scenarios without running them
    List(list::ListArgs),
}

/// Exit status for errors raised before any scenario ran
const SETUP_ERROR_EXIT: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run(args) => run::execute(args, cli.format).await,
        Commands::List(args) => list::execute(args, cli.format).map(|()| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            std::process::exit(SETUP_ERROR_EXIT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags_parse() {
        let cli = Cli::try_parse_from([
            "sitecheck",
            "run",
            "--tag",
            "mermaid",
            "--concurrency",
            "2",
            "--browser",
            "firefox",
            "--headed",
            "--base-url",
            "http://127.0.0.1:4000",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(matches!(cli.format, output::OutputFormat::Json));
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.selection.tag.as_deref(), Some("mermaid"));
                assert_eq!(args.concurrency, Some(2));
                assert_eq!(args.browser.as_deref(), Some("firefox"));
                assert!(args.headed);
                assert_eq!(args.base_url.as_deref(), Some("http://127.0.0.1:4000"));
            }
            Commands::List(_) => panic!("expected run"),
        }
    }
}
