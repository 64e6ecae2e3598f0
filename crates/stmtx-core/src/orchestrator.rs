//! Extraction orchestrator: ordered strategies with fallback.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::acquisition::{PageDiagnostics, TextAcquirer, TextMethod};
use crate::ai::{AiBackend, AiTransactionParser, LegacyAiExtractor, OpenAiBackend};
use crate::bank::{BankLabel, identify_bank};
use crate::categorize::{categorize, categorize_with_ai};
use crate::error::Result;
use crate::finalize::Finalizer;
use crate::models::{StatementConfig, TransactionCandidate, TransactionRecord};
use crate::ocr::OcrBackend;
use crate::pdf::{PdfExtractor, PdfProcessor};
use crate::statement::{TemplateParser, TransactionParser, parser_for};

/// One self-contained extraction algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Chunked AI extraction.
    AiChunked,
    /// Parser specific to the identified bank.
    BankRegex,
    /// Bank-independent line templates.
    GenericRegex,
    /// Windowed AI extraction with strict validation.
    LegacyAi,
}

impl Strategy {
    /// Fallback order.
    pub const ORDER: [Strategy; 4] = [
        Strategy::AiChunked,
        Strategy::BankRegex,
        Strategy::GenericRegex,
        Strategy::LegacyAi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::AiChunked => "ai_chunked",
            Strategy::BankRegex => "bank_regex",
            Strategy::GenericRegex => "generic_regex",
            Strategy::LegacyAi => "legacy_ai",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one document extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    /// Identified bank.
    pub bank: BankLabel,
    /// Records in the winning strategy's order.
    pub transactions: Vec<TransactionRecord>,
    /// Winning strategy, `None` when every strategy came up empty.
    pub strategy: Option<Strategy>,
    /// How the document text was obtained.
    pub text_method: TextMethod,
    /// Per-page acquisition diagnostics.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageDiagnostics>,
}

/// Bank-statement extractor.
///
/// ```no_run
/// use stmtx_core::{StatementConfig, StatementExtractor};
///
/// let extractor = StatementExtractor::new(StatementConfig::default());
/// let outcome = extractor.extract_file("statement.pdf".as_ref(), "sk-...")?;
/// println!("{}: {} transactions", outcome.bank, outcome.transactions.len());
/// # Ok::<(), stmtx_core::StatementError>(())
/// ```
pub struct StatementExtractor {
    config: StatementConfig,
    ai: Option<Box<dyn AiBackend>>,
    ocr: Option<Box<dyn OcrBackend>>,
}

impl StatementExtractor {
    /// Create an extractor using the configured OpenAI endpoint and no OCR.
    pub fn new(config: StatementConfig) -> Self {
        Self {
            config,
            ai: None,
            ocr: None,
        }
    }

    /// Use a specific AI backend.
    pub fn with_ai_backend(mut self, backend: impl AiBackend + 'static) -> Self {
        self.ai = Some(Box::new(backend));
        self
    }

    /// Use an OCR engine for image-only pages.
    pub fn with_ocr_backend(mut self, backend: impl OcrBackend + 'static) -> Self {
        self.ocr = Some(Box::new(backend));
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &StatementConfig {
        &self.config
    }

    /// Extract transactions from a statement file.
    pub fn extract_file(&self, path: &Path, credential: &str) -> Result<ExtractionOutcome> {
        let data = std::fs::read(path)?;
        info!("Processing {}", path.display());
        self.extract(&data, credential)
    }

    /// Extract transactions from statement bytes.
    ///
    /// Only an unreadable document is an error. Page, strategy and record
    /// failures degrade to fewer (possibly zero) transactions.
    pub fn extract(&self, document: &[u8], credential: &str) -> Result<ExtractionOutcome> {
        let start = Instant::now();

        let mut pdf = PdfExtractor::new();
        pdf.load(document)?;

        let acquired = TextAcquirer::new(&pdf, self.ocr.as_deref(), &self.config).acquire();
        let mut outcome = self.extract_text(&acquired.text, credential);
        outcome.text_method = acquired.method;
        outcome.pages = acquired.pages;

        info!(
            "Extracted {} transactions ({}) in {}ms",
            outcome.transactions.len(),
            outcome.strategy.map_or("none", |s| s.name()),
            start.elapsed().as_millis()
        );
        Ok(outcome)
    }

    /// Run identification and the strategy chain on already acquired text.
    pub fn extract_text(&self, text: &str, credential: &str) -> ExtractionOutcome {
        let bank = identify_bank(text);
        info!("Bank: {}", bank);

        let default_backend;
        let backend: &dyn AiBackend = match &self.ai {
            Some(backend) => backend.as_ref(),
            None => {
                default_backend = OpenAiBackend::new(self.config.ai.endpoint.clone());
                &default_backend
            }
        };

        let finalizer = Finalizer::new(&self.config.extraction);

        for strategy in Strategy::ORDER {
            let candidates = match self.run_strategy(strategy, backend, text, bank, credential) {
                Ok(Some(candidates)) => candidates,
                Ok(None) => {
                    debug!("{}: not applicable", strategy);
                    continue;
                }
                Err(e) => {
                    warn!("{} failed: {}", strategy, e);
                    continue;
                }
            };

            let mut records = finalizer.finalize(&candidates);
            info!(
                "{}: {} candidates, {} records",
                strategy,
                candidates.len(),
                records.len()
            );

            if !records.is_empty() {
                self.assign_categories(&mut records, backend, credential);
                return ExtractionOutcome {
                    bank,
                    transactions: records,
                    strategy: Some(strategy),
                    text_method: TextMethod::TextLayer,
                    pages: Vec::new(),
                };
            }
        }

        info!("All strategies exhausted without transactions");
        ExtractionOutcome {
            bank,
            transactions: Vec::new(),
            strategy: None,
            text_method: TextMethod::TextLayer,
            pages: Vec::new(),
        }
    }

    fn run_strategy(
        &self,
        strategy: Strategy,
        backend: &dyn AiBackend,
        text: &str,
        bank: BankLabel,
        credential: &str,
    ) -> Result<Option<Vec<TransactionCandidate>>> {
        let candidates = match strategy {
            Strategy::AiChunked => AiTransactionParser::new(backend, &self.config.ai, &self.config.extraction)
                .parse_ai(text, bank, credential)?,
            Strategy::BankRegex => match parser_for(bank) {
                Some(parser) => parser.parse(text)?,
                None => return Ok(None),
            },
            Strategy::GenericRegex => TemplateParser::generic().parse(text)?,
            Strategy::LegacyAi => LegacyAiExtractor::new(backend, &self.config.ai, &self.config.extraction)
                .extract(text, credential)?,
        };
        Ok(Some(candidates))
    }

    fn assign_categories(&self, records: &mut [TransactionRecord], backend: &dyn AiBackend, credential: &str) {
        let use_ai = self.config.ai.categorize_with_ai && !credential.trim().is_empty();

        for record in records.iter_mut().filter(|r| r.is_uncategorized()) {
            record.category = if use_ai {
                categorize_with_ai(backend, &self.config.ai, credential, &record.description)
            } else {
                categorize(&record.description).to_string()
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::CompletionRequest;
    use crate::error::AiError;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::cell::RefCell;
    use std::str::FromStr;

    const HSBC_TEXT: &str = "HSBC MEXICO ESTADO DE CUENTA\n\
        04-Jun-2025  04-Jun-2025  SU PAGO GRACIAS SPEI A CTA CLABE XXXXXXXX1179  + $9,153.00\n\
        05-Jun-2025  05-Jun-2025  COMPRA TARJETA OXXO MONTERREY  - $150.00\n";

    struct FailingBackend;

    impl AiBackend for FailingBackend {
        fn complete(&self, _credential: &str, _request: &CompletionRequest) -> std::result::Result<String, AiError> {
            Err(AiError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    /// Answers by model name so the chunked and legacy steps can differ.
    struct ModelBackend {
        primary: &'static str,
        legacy: &'static str,
        calls: RefCell<usize>,
    }

    impl AiBackend for ModelBackend {
        fn complete(&self, _credential: &str, request: &CompletionRequest) -> std::result::Result<String, AiError> {
            *self.calls.borrow_mut() += 1;
            let answer = if request.model == "gpt-3.5-turbo" { self.legacy } else { self.primary };
            Ok(answer.to_string())
        }
    }

    fn extractor() -> StatementExtractor {
        StatementExtractor::new(StatementConfig::default())
    }

    #[test]
    fn test_ai_failure_falls_back_to_bank_parser() {
        let outcome = extractor()
            .with_ai_backend(FailingBackend)
            .extract_text(HSBC_TEXT, "sk-test");

        assert_eq!(outcome.bank, BankLabel::Hsbc);
        assert_eq!(outcome.strategy, Some(Strategy::BankRegex));
        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.transactions[0].amount, Decimal::from_str("9153.00").unwrap());
        assert_eq!(outcome.transactions[0].category, "ingreso");
        assert_eq!(outcome.transactions[1].amount, Decimal::from_str("-150.00").unwrap());
        assert_eq!(outcome.transactions[1].category, "conveniencia");
    }

    #[test]
    fn test_ai_result_wins_when_present() {
        let backend = ModelBackend {
            primary: r#"[{"fecha_operacion": "04-Jun-2025", "descripcion": "SU PAGO GRACIAS", "monto": 9153.00, "categoria": "ingreso"}]"#,
            legacy: "[]",
            calls: RefCell::new(0),
        };
        let outcome = extractor().with_ai_backend(backend).extract_text(HSBC_TEXT, "sk-test");

        assert_eq!(outcome.strategy, Some(Strategy::AiChunked));
        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(outcome.transactions[0].category, "ingreso");
    }

    #[test]
    fn test_missing_credential_skips_ai() {
        let outcome = extractor().with_ai_backend(FailingBackend).extract_text(HSBC_TEXT, "");
        assert_eq!(outcome.strategy, Some(Strategy::BankRegex));
    }

    #[test]
    fn test_unknown_bank_uses_generic_parser() {
        let text = "MI BANCO\n05-Jun-2025  COMPRA TARJETA OXXO MONTERREY  - $150.00";
        let outcome = extractor().with_ai_backend(FailingBackend).extract_text(text, "sk-test");

        assert_eq!(outcome.bank, BankLabel::Unknown);
        assert_eq!(outcome.strategy, Some(Strategy::GenericRegex));
        assert_eq!(outcome.transactions.len(), 1);
    }

    #[test]
    fn test_legacy_is_last_resort() {
        let backend = ModelBackend {
            primary: "no transactions here",
            legacy: r#"[{"fecha_operacion": "05-Jun-2025", "descripcion": "COMISION ANUAL", "monto": -600.00}]"#,
            calls: RefCell::new(0),
        };
        let outcome = extractor()
            .with_ai_backend(backend)
            .extract_text("Statement without recognizable rows", "sk-test");

        assert_eq!(outcome.strategy, Some(Strategy::LegacyAi));
        assert_eq!(outcome.transactions[0].category, "comision");
    }

    #[test]
    fn test_exhausted_is_empty_not_error() {
        let outcome = extractor()
            .with_ai_backend(FailingBackend)
            .extract_text("BBVA\nnothing to see", "sk-test");

        assert_eq!(outcome.bank, BankLabel::Bbva);
        assert_eq!(outcome.strategy, None);
        assert!(outcome.transactions.is_empty());
    }

    #[test]
    fn test_unreadable_document_is_an_error() {
        assert!(extractor().with_ai_backend(FailingBackend).extract(b"garbage", "sk").is_err());
    }

    #[test]
    fn test_strategy_order() {
        let names: Vec<&str> = Strategy::ORDER.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["ai_chunked", "bank_regex", "generic_regex", "legacy_ai"]);
    }
}
