//! Process command - extract transactions from a single statement.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, info};

use stmtx_core::{ExtractionOutcome, TransactionRecord, TransactionSink, persist_transactions};

use super::ExtractOptions;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input statement (PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show per-page text acquisition details
    #[arg(long)]
    show_pages: bool,

    /// Append the transactions as JSON lines to this file
    #[arg(long)]
    store: Option<PathBuf>,

    /// Owner id recorded with stored transactions
    #[arg(long, default_value = "local")]
    owner: String,

    #[command(flatten)]
    extract: ExtractOptions,
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

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "pdf" {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Extracting transactions...");

    let input = args.input.clone();
    let result = super::with_extractor(config, args.extract.clone(), move |extractor, credential| {
        Ok(extractor.extract_file(&input, credential)?)
    })
    .await;
    pb.finish_and_clear();
    let outcome = result?;

    if args.show_pages {
        for page in &outcome.pages {
            eprintln!(
                "{} page {}: {:?}, {} chars{}",
                style("ℹ").blue(),
                page.page,
                page.method,
                page.chars,
                page.error.as_deref().map(|e| format!(" ({})", e)).unwrap_or_default()
            );
        }
    }

    let output = format_outcome(&outcome, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if let Some(store_path) = &args.store {
        let file = OpenOptions::new().create(true).append(true).open(store_path)?;
        let mut sink = JsonLinesSink::new(BufWriter::new(file));
        let summary = persist_transactions(&mut sink, &outcome.transactions, &args.owner);
        sink.writer.flush()?;
        eprintln!(
            "{} Stored {} transactions in {} ({} skipped)",
            style("✓").green(),
            summary.saved,
            store_path.display(),
            summary.skipped
        );
    }

    if outcome.transactions.is_empty() {
        eprintln!(
            "{} No transactions found ({} statement)",
            style("!").yellow(),
            outcome.bank
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Transaction store writing one JSON object per line.
struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> TransactionSink for JsonLinesSink<W> {
    type Error = anyhow::Error;

    fn create_transaction(&mut self, record: &TransactionRecord, owner_id: &str) -> anyhow::Result<()> {
        if record.description.trim().is_empty() {
            anyhow::bail!("empty description");
        }
        let line = serde_json::json!({
            "owner_id": owner_id,
            "transaction": record,
        });
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }
}

pub fn format_outcome(outcome: &ExtractionOutcome, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
        OutputFormat::Csv => format_csv(&outcome.transactions),
        OutputFormat::Text => Ok(format_text(outcome)),
    }
}

fn format_csv(records: &[TransactionRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "date",
        "charge_date",
        "description",
        "amount",
        "kind",
        "category",
    ])?;

    for record in records {
        wtr.write_record([
            &record.date.to_string(),
            &record.charge_date.map(|d| d.to_string()).unwrap_or_default(),
            &record.description,
            &record.amount.to_string(),
            record.kind.label(),
            &record.category,
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

/// Sum of charges and sum of credits.
pub fn totals(records: &[TransactionRecord]) -> (Decimal, Decimal) {
    records.iter().fold((Decimal::ZERO, Decimal::ZERO), |(charges, credits), r| {
        if r.amount.is_sign_negative() {
            (charges + r.amount, credits)
        } else {
            (charges, credits + r.amount)
        }
    })
}

fn format_text(outcome: &ExtractionOutcome) -> String {
    let mut output = String::new();

    output.push_str(&format!("Bank: {}\n", outcome.bank));
    output.push_str(&format!(
        "Strategy: {}\n",
        outcome.strategy.map_or("none", |s| s.name())
    ));
    output.push_str(&format!("Transactions: {}\n", outcome.transactions.len()));
    output.push('\n');

    for record in &outcome.transactions {
        output.push_str(&format!(
            "{}  {:<50}  {:>12}  {}\n",
            record.date,
            truncate(&record.description, 50),
            record.amount,
            record.category
        ));
    }

    let (charges, credits) = totals(&outcome.transactions);
    output.push('\n');
    output.push_str(&format!("Charges: {}\n", charges));
    output.push_str(&format!("Credits: {}\n", credits));

    output
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars - 1).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;
    use stmtx_core::{BankLabel, Strategy, TextMethod, TransactionKind};

    fn record(description: &str, amount: &str) -> TransactionRecord {
        let amount = Decimal::from_str(amount).unwrap();
        TransactionRecord {
            date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            charge_date: None,
            description: description.to_string(),
            amount,
            kind: TransactionKind::from_amount(amount),
            category: "otros".to_string(),
        }
    }

    fn outcome() -> ExtractionOutcome {
        ExtractionOutcome {
            bank: BankLabel::Hsbc,
            transactions: vec![record("SU PAGO, GRACIAS", "9153.00"), record("OXXO", "-150.00")],
            strategy: Some(Strategy::BankRegex),
            text_method: TextMethod::TextLayer,
            pages: Vec::new(),
        }
    }

    #[test]
    fn test_csv_quotes_descriptions() {
        let csv = format_outcome(&outcome(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,charge_date,description,amount,kind,category");
        assert_eq!(lines[1], "2025-06-05,,\"SU PAGO, GRACIAS\",9153.00,abono,otros");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_totals() {
        let (charges, credits) = totals(&outcome().transactions);
        assert_eq!(charges, Decimal::from_str("-150.00").unwrap());
        assert_eq!(credits, Decimal::from_str("9153.00").unwrap());
    }

    #[test]
    fn test_text_summary() {
        let text = format_outcome(&outcome(), OutputFormat::Text).unwrap();
        assert!(text.starts_with("Bank: HSBC\nStrategy: bank_regex\nTransactions: 2\n"));
        assert!(text.contains("Charges: -150.00"));
    }

    #[test]
    fn test_json_lines_store() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let mut records = outcome().transactions;
        records.push(record("  ", "-10.00"));

        let summary = persist_transactions(&mut sink, &records, "user-7");
        assert_eq!(summary.saved, 2);
        assert_eq!(summary.skipped, 1);

        let written = String::from_utf8(sink.writer).unwrap();
        let first: serde_json::Value = serde_json::from_str(written.lines().next().unwrap()).unwrap();
        assert_eq!(first["owner_id"], "user-7");
        assert_eq!(first["transaction"]["description"], "SU PAGO, GRACIAS");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
