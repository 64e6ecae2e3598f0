//! End-to-end extraction over statement text through the public API.

use std::cell::RefCell;
use std::str::FromStr;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use stmtx_core::error::AiError;
use stmtx_core::{
    AiBackend, BankLabel, CompletionRequest, StatementConfig, StatementExtractor, Strategy,
    TransactionKind, TransactionRecord, TransactionSink, persist_transactions,
};

const SANTANDER_STATEMENT: &str = "BANCO SANTANDER MEXICO\n\
    ESTADO DE CUENTA SUPER CUENTA\n\
    FECHA FOLIO DESCRIPCION DEPOSITO RETIRO SALDO\n\
    03-JUN-2025 1234567 DEPOSITO EN EFECTIVO 2,000.00 15,300.25\n\
    04-JUN-2025 1234568 PAGO SERVICIO TELMEX 499.00 14,801.25\n\
    04-JUN-2025 1234568 PAGO SERVICIO TELMEX 499.00 14,801.25\n";

/// Backend that is down for extraction and answers category prompts.
struct CategoryOnlyBackend {
    category: &'static str,
    category_calls: RefCell<usize>,
}

impl AiBackend for CategoryOnlyBackend {
    fn complete(&self, _credential: &str, request: &CompletionRequest) -> Result<String, AiError> {
        if request.system.is_some() {
            return Err(AiError::Request("connection refused".to_string()));
        }
        *self.category_calls.borrow_mut() += 1;
        Ok(self.category.to_string())
    }
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn test_santander_statement_without_credential() {
    let outcome = StatementExtractor::new(StatementConfig::default()).extract_text(SANTANDER_STATEMENT, "");

    assert_eq!(outcome.bank, BankLabel::Santander);
    assert_eq!(outcome.strategy, Some(Strategy::BankRegex));
    // The repeated TELMEX row collapses into one record.
    assert_eq!(outcome.transactions.len(), 2);

    let deposit = &outcome.transactions[0];
    assert_eq!(deposit.date, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
    assert_eq!(deposit.amount, dec("2000.00"));
    assert_eq!(deposit.kind, TransactionKind::Credit);
    assert_eq!(deposit.category, "ingreso");

    let payment = &outcome.transactions[1];
    assert_eq!(payment.description, "PAGO SERVICIO TELMEX");
    assert_eq!(payment.amount, dec("-499.00"));
    assert_eq!(payment.kind, TransactionKind::Charge);
    assert_eq!(payment.category, "servicios");
}

#[test]
fn test_ai_categorization_when_enabled() {
    let mut config = StatementConfig::default();
    config.ai.categorize_with_ai = true;
    let backend = CategoryOnlyBackend {
        category: "Supermercado.",
        category_calls: RefCell::new(0),
    };

    let outcome = StatementExtractor::new(config)
        .with_ai_backend(backend)
        .extract_text(SANTANDER_STATEMENT, "sk-test");

    assert_eq!(outcome.strategy, Some(Strategy::BankRegex));
    assert!(outcome.transactions.iter().all(|t| t.category == "supermercado"));
}

#[test]
fn test_records_are_idempotent_under_reextraction() {
    let extractor = StatementExtractor::new(StatementConfig::default());
    let first = extractor.extract_text(SANTANDER_STATEMENT, "");
    let second = extractor.extract_text(SANTANDER_STATEMENT, "");
    assert_eq!(first.transactions, second.transactions);
}

#[test]
fn test_outcome_serializes_for_callers() {
    let outcome = StatementExtractor::new(StatementConfig::default()).extract_text(SANTANDER_STATEMENT, "");
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["bank"], "Santander");
    assert_eq!(json["strategy"], "bank_regex");
    assert_eq!(json["text_method"], "text_layer");
    assert_eq!(json["transactions"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_empty_document_text() {
    let outcome = StatementExtractor::new(StatementConfig::default()).extract_text("", "");
    assert_eq!(outcome.bank, BankLabel::Unknown);
    assert_eq!(outcome.strategy, None);
    assert!(outcome.transactions.is_empty());
}

struct MemorySink {
    rows: Vec<(String, TransactionRecord)>,
    reject_over: Decimal,
}

impl TransactionSink for MemorySink {
    type Error = String;

    fn create_transaction(&mut self, record: &TransactionRecord, owner_id: &str) -> Result<(), String> {
        if record.amount.abs() > self.reject_over {
            return Err(format!("amount {} over limit", record.amount));
        }
        self.rows.push((owner_id.to_string(), record.clone()));
        Ok(())
    }
}

#[test]
fn test_persist_extracted_records() {
    let outcome = StatementExtractor::new(StatementConfig::default()).extract_text(SANTANDER_STATEMENT, "");
    let mut sink = MemorySink {
        rows: Vec::new(),
        reject_over: dec("1000"),
    };

    let summary = persist_transactions(&mut sink, &outcome.transactions, "user-42");

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(sink.rows[0].0, "user-42");
    assert_eq!(sink.rows[0].1.description, "PAGO SERVICIO TELMEX");
}
