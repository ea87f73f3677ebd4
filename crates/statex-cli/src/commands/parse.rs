//! Parse command - extract transactions from a single statement file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use statex_core::{
    DocumentType, HybridStatementParser, ParseResult, ResultValidator, StatementParser,
    ValidationReport,
};

use super::{load_config, read_request};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input file (.txt OCR text or .json parse request)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Bank hint (code, name, or keyword, e.g. "td")
    #[arg(long)]
    bank: Option<String>,

    /// Expected document type (e.g. "bank_statement")
    #[arg(long)]
    document_type: Option<String>,

    /// Language hint ("en" or "fr")
    #[arg(long)]
    language: Option<String>,

    /// Require a date on every transaction line
    #[arg(long)]
    strict: bool,

    /// Echo the raw text back in the result
    #[arg(long)]
    include_raw_text: bool,

    /// Validate the result and report issues
    #[arg(long)]
    validate: bool,

    /// Show extraction confidence
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per transaction
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Parsing file: {}", args.input.display());

    let mut request = read_request(&args.input)?;
    if let Some(bank) = &args.bank {
        request = request.with_bank_hint(bank.as_str());
    }
    if let Some(document_type) = &args.document_type {
        request = request.with_document_type(document_type.parse::<DocumentType>()?);
    }
    if let Some(language) = &args.language {
        request = request.with_language_hint(language.as_str());
    }
    let strict = request.strict_mode || args.strict;
    let include_raw_text = request.include_raw_text || args.include_raw_text;
    let request = request
        .with_strict_mode(strict)
        .with_raw_text(include_raw_text);

    let parser = HybridStatementParser::from_config(&config.parser);
    let result = parser.parse(&request);

    if args.validate {
        let report = ResultValidator::from_config(&config.validation).validate(&result);
        print_report(&report);
    }

    let output = format_result(&result, args.format, config.output.pretty)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        println!();
        println!(
            "{} Overall confidence: {} (quality {:.1})",
            style("ℹ").blue(),
            result.overall_confidence,
            result.metadata.quality_score
        );
        println!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn print_report(report: &ValidationReport) {
    let verdict = if report.is_valid {
        style("valid").green()
    } else {
        style("invalid").red()
    };
    eprintln!("Validation: {} (score {})", verdict, report.validation_score);
    for issue in &report.issues {
        eprintln!("  - [{}] {}", issue.severity, issue.message);
    }
}

/// Render a parse result in the requested format.
pub fn format_result(
    result: &ParseResult,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ParseResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "date",
        "description",
        "type",
        "amount",
        "currency",
        "running_balance",
        "category",
        "merchant",
        "reference",
        "confidence",
    ])?;

    for tx in &result.transactions {
        wtr.write_record([
            tx.date.as_ref().map(|d| d.date.to_string()).unwrap_or_default(),
            tx.description.clone(),
            tx.transaction_type.to_string(),
            tx.amount.amount.to_string(),
            tx.amount.currency.to_string(),
            tx.running_balance
                .as_ref()
                .map(|b| b.amount.to_string())
                .unwrap_or_default(),
            tx.suggested_category.clone().unwrap_or_default(),
            tx.merchant.clone().unwrap_or_default(),
            tx.reference.clone().unwrap_or_default(),
            tx.confidence.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ParseResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Document: {}\n", result.metadata.document_type));
    if let Some(bank) = &result.detected_bank {
        output.push_str(&format!("Bank: {}\n", bank));
    }
    if let Some(account) = &result.account_info {
        if let Some(institution) = &account.institution_name {
            output.push_str(&format!("Institution: {}\n", institution));
        }
        if let Some(number) = &account.account_number_masked {
            output.push_str(&format!("Account: {}\n", number));
        }
    }
    if let (Some(start), Some(end)) = (result.metadata.period_start, result.metadata.period_end) {
        output.push_str(&format!("Period: {} to {}\n", start, end));
    }
    output.push('\n');

    output.push_str(&format!("Transactions ({}):\n", result.transactions.len()));
    for tx in &result.transactions {
        let date = tx
            .date
            .as_ref()
            .map(|d| d.date.to_string())
            .unwrap_or_else(|| "----------".to_string());
        output.push_str(&format!(
            "  {}  {:<40} {:>12} {}\n",
            date,
            tx.description,
            tx.signed_amount().to_string(),
            tx.transaction_type
        ));
    }
    output.push('\n');

    output.push_str("Balances:\n");
    let lines = [
        ("Opening", &result.opening_balance),
        ("Closing", &result.closing_balance),
        ("Credits", &result.total_credits),
        ("Debits", &result.total_debits),
    ];
    for (label, amount) in lines {
        if let Some(amount) = amount {
            output.push_str(&format!("  {:<8} {} {}\n", label, amount.amount, amount.currency));
        }
    }
    output.push('\n');

    output.push_str(&format!("Confidence: {}\n", result.overall_confidence));

    if !result.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
