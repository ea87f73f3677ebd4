//! Validate command - audit a saved parse result.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use statex_core::{ParseResult, ResultValidator, ValidationReport};

use super::load_config;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Parse result JSON file
    #[arg(required = true)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ReportFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ReportFormat {
    /// JSON report
    Json,
    /// Human-readable report
    Text,
}

pub async fn run(args: ValidateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let content = fs::read_to_string(&args.input)?;
    let result = ParseResult::from_json(&content)?;
    let report = ResultValidator::from_config(&config.validation).validate(&result);

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print_text(&report),
    }

    if !report.is_valid {
        anyhow::bail!("Validation failed with score {}", report.validation_score);
    }

    Ok(())
}

fn print_text(report: &ValidationReport) {
    if report.is_valid {
        println!(
            "{} Result is valid (score {})",
            style("✓").green(),
            report.validation_score
        );
    } else {
        println!(
            "{} Result is invalid (score {})",
            style("✗").red(),
            report.validation_score
        );
    }

    if !report.issues.is_empty() {
        println!();
        println!("{}", style("Issues:").yellow());
        for issue in &report.issues {
            println!("  - [{}] {}: {}", issue.severity, issue.issue_type, issue.message);
        }
    }

    if !report.recommendations.is_empty() {
        println!();
        println!("Recommendations:");
        for recommendation in &report.recommendations {
            println!("  - {}", recommendation);
        }
    }
}
