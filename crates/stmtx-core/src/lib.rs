//! Core library for bank statement transaction extraction.
//!
//! This crate provides:
//! - Text acquisition from statement PDFs (text layer, OCR fallback)
//! - Bank identification for Mexican issuers
//! - Ordered extraction strategies: chunked AI, bank parsers, generic line
//!   templates and a windowed legacy AI pass
//! - Deduplication, normalization and categorization of transactions

pub mod acquisition;
pub mod ai;
pub mod bank;
pub mod categorize;
pub mod error;
pub mod finalize;
pub mod models;
pub mod ocr;
pub mod orchestrator;
pub mod pdf;
pub mod persist;
pub mod statement;

pub use acquisition::{AcquiredText, PageDiagnostics, TextAcquirer, TextMethod};
pub use ai::{AiBackend, CompletionRequest, OpenAiBackend};
pub use bank::{BankLabel, identify_bank};
pub use categorize::{CATEGORIES, categorize};
pub use error::{Result, StatementError};
pub use finalize::Finalizer;
pub use models::{StatementConfig, TransactionCandidate, TransactionKind, TransactionRecord};
pub use ocr::{ImagePreprocessor, LATIN_SCRIPT_LANGUAGES, LayoutMode, OcrBackend, OcrRequest};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use orchestrator::{ExtractionOutcome, StatementExtractor, Strategy};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use persist::{PersistSummary, TransactionSink, persist_transactions};
pub use statement::{TemplateParser, TransactionParser};
