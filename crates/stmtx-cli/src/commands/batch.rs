//! Batch command - extract transactions from many statements.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use stmtx_core::ExtractionOutcome;

use super::ExtractOptions;
use super::process::{OutputFormat, format_outcome, totals};

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

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    extract: ExtractOptions,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    outcome: Option<ExtractionOutcome>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} statements to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let continue_on_error = args.continue_on_error;
    let pb = overall_pb.clone();
    let results = super::with_extractor(config, args.extract.clone(), move |extractor, credential| {
        let mut results = Vec::with_capacity(files.len());

        for path in files {
            let file_start = Instant::now();
            let result = extractor.extract_file(&path, credential);
            let processing_time_ms = file_start.elapsed().as_millis() as u64;

            match result {
                Ok(outcome) => results.push(ProcessResult {
                    path,
                    outcome: Some(outcome),
                    error: None,
                    processing_time_ms,
                }),
                Err(e) if continue_on_error => {
                    warn!("Failed to process {}: {}", path.display(), e);
                    results.push(ProcessResult {
                        path,
                        outcome: None,
                        error: Some(e.to_string()),
                        processing_time_ms,
                    });
                }
                Err(e) => {
                    error!("Failed to process {}: {}", path.display(), e);
                    anyhow::bail!("Processing failed: {}", e);
                }
            }

            pb.inc(1);
        }

        Ok(results)
    })
    .await;
    overall_pb.finish_and_clear();
    let results = results?;

    let successful: Vec<_> = results.iter().filter(|r| r.outcome.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(outcome) = &result.outcome {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("statement");
                let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_outcome(outcome, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let transaction_count: usize = successful
        .iter()
        .filter_map(|r| r.outcome.as_ref())
        .map(|o| o.transactions.len())
        .sum();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed, {} transactions",
        style(successful.len()).green(),
        style(failed.len()).red(),
        transaction_count
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "bank",
        "strategy",
        "text_method",
        "transactions",
        "total_charges",
        "total_credits",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        if let Some(outcome) = &result.outcome {
            let (charges, credits) = totals(&outcome.transactions);
            wtr.write_record([
                filename,
                "success",
                outcome.bank.name(),
                outcome.strategy.map_or("none", |s| s.name()),
                match outcome.text_method {
                    stmtx_core::TextMethod::TextLayer => "text_layer",
                    stmtx_core::TextMethod::Ocr => "ocr",
                },
                &outcome.transactions.len().to_string(),
                &charges.to_string(),
                &credits.to_string(),
                &result.processing_time_ms.to_string(),
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
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
