//! Batch processing command for multiple statement files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use statex_core::{ExtractionError, HybridStatementParser, ParseResult, StatementParser};

use super::parse::{format_result, OutputFormat};
use super::{is_supported, load_config, read_request};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Bank hint applied to every file
    #[arg(long)]
    bank: Option<String>,

    /// Require a date on every transaction line
    #[arg(long)]
    strict: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: Option<ParseResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let parser = Arc::new(
        HybridStatementParser::from_config(&config.parser)
            .with_strict_mode(config.parser.strict_mode || args.strict),
    );

    // Parsing is CPU-bound; the semaphore caps how many run at once.
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let parser = Arc::clone(&parser);
        let bank = args.bank.clone();
        let pb = overall_pb.clone();
        let task_path = path.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let outcome = process_single_file(&task_path, &parser, bank.as_deref());
            pb.inc(1);
            (outcome, file_start.elapsed().as_millis() as u64)
        });
        handles.push((path, handle));
    }

    let mut results = Vec::with_capacity(handles.len());

    for (path, handle) in handles {
        let (outcome, processing_time_ms) = match handle.await {
            Ok(done) => done,
            Err(e) => (Err(ExtractionError::Failed(e.to_string()).into()), 0),
        };

        match outcome {
            Ok(result) => results.push(ProcessResult {
                path,
                result: Some(result),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        result: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.result.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for processed in &successful {
            let Some(result) = &processed.result else {
                continue;
            };
            let output_name = processed
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("statement");

            let output_path =
                output_dir.join(format!("{}.{}", output_name, args.format.extension()));
            let content = format_result(result, args.format, config.output.pretty)?;

            fs::write(&output_path, content)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for processed in &failed {
            println!(
                "  - {}: {}",
                processed.path.display(),
                processed.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    parser: &HybridStatementParser,
    bank: Option<&str>,
) -> anyhow::Result<ParseResult> {
    let mut request = read_request(path)?;
    if request.raw_text.trim().is_empty() {
        anyhow::bail!("No text in {}", path.display());
    }
    if let Some(bank) = bank {
        request.bank_name_hint = Some(bank.to_string());
    }
    Ok(parser.parse(&request))
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "detected_bank",
        "document_type",
        "transactions",
        "opening_balance",
        "closing_balance",
        "confidence",
        "processing_time_ms",
        "error",
    ])?;

    for processed in results {
        let filename = processed
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(result) = &processed.result {
            let balance = |b: &Option<statex_core::ExtractedAmount>| {
                b.as_ref().map(|a| a.amount.to_string()).unwrap_or_default()
            };
            wtr.write_record([
                filename,
                "success",
                result.detected_bank.as_deref().unwrap_or(""),
                &result.metadata.document_type.to_string(),
                &result.transactions.len().to_string(),
                &balance(&result.opening_balance),
                &balance(&result.closing_balance),
                &result.overall_confidence.to_string(),
                &processed.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                &processed.processing_time_ms.to_string(),
                processed.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
