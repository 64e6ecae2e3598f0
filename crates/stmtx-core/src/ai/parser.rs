//! Chunked AI extraction and response decoding.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, info, trace, warn};

use super::chunking::chunk_text;
use super::prompts::{EXTRACTION_SYSTEM, extraction_prompt};
use super::validate::CandidateValidator;
use super::{AiBackend, CompletionRequest};
use crate::bank::BankLabel;
use crate::error::{AiError, ExtractionError, Result};
use crate::models::config::{AiConfig, ExtractionConfig};
use crate::models::{TransactionCandidate, UNCATEGORIZED};
use crate::statement::rules::patterns::{
    RECOVER_DATE_DASH_DESC, RECOVER_DATE_DESC_AMOUNT, RECOVER_DESC_AMOUNT_DATE,
};
use crate::statement::rules::{LineTemplate, SignPolicy, clean_description, match_first, parse_amount};

/// A transaction object as returned by the backend. Spanish and English
/// field names are both accepted.
#[derive(Debug, Deserialize)]
struct AiTransaction {
    #[serde(alias = "fecha_operacion", alias = "fecha", alias = "date")]
    operation_date: String,
    #[serde(default, alias = "fecha_cargo")]
    charge_date: Option<String>,
    #[serde(alias = "descripcion", alias = "concepto")]
    description: String,
    #[serde(alias = "monto", alias = "importe")]
    amount: Value,
    #[serde(default, alias = "categoria")]
    category: Option<String>,
}

impl AiTransaction {
    fn into_candidate(self) -> Option<TransactionCandidate> {
        let amount = match &self.amount {
            Value::Number(n) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .ok()?,
            Value::String(s) => parse_amount(s).ok()?,
            _ => return None,
        };

        let mut candidate =
            TransactionCandidate::new(self.operation_date.trim(), clean_description(&self.description), amount);
        if let Some(charge) = self.charge_date.filter(|c| !c.trim().is_empty()) {
            candidate = candidate.with_charge_date(charge.trim());
        }
        let category = self
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        Some(candidate.with_category(category))
    }
}

/// Strip a Markdown code fence around a response, if present.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Decode a structured response: a JSON array of transactions, or an object
/// with a `transactions` array. Items that do not decode are skipped.
pub fn parse_response(content: &str) -> std::result::Result<Vec<TransactionCandidate>, ExtractionError> {
    let value: Value = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| ExtractionError::Unparseable(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("transactions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ExtractionError::Unparseable(
                    "object without a transactions array".to_string(),
                ));
            }
        },
        _ => {
            return Err(ExtractionError::Unparseable(
                "expected an array of transactions".to_string(),
            ));
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<AiTransaction>(item) {
            Ok(tx) => tx.into_candidate(),
            Err(e) => {
                trace!("skipping malformed transaction object: {}", e);
                None
            }
        })
        .collect())
}

/// Best-effort recovery of candidates from a free-form response, one line at
/// a time.
pub fn recover_from_text(content: &str, sign: &SignPolicy) -> Vec<TransactionCandidate> {
    let templates = [
        LineTemplate::new("date_dash_desc", &RECOVER_DATE_DASH_DESC),
        LineTemplate::new("date_desc_amount", &RECOVER_DATE_DESC_AMOUNT),
        LineTemplate::new("desc_amount_date", &RECOVER_DESC_AMOUNT_DATE),
    ];

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match_first(&templates, line))
        .filter_map(|(_, matched)| matched.into_candidate(sign).ok())
        .collect()
}

/// Primary AI strategy: chunk the text, extract per chunk, validate.
pub struct AiTransactionParser<'a> {
    backend: &'a dyn AiBackend,
    config: &'a AiConfig,
    validator: CandidateValidator,
    sign: SignPolicy,
}

impl<'a> AiTransactionParser<'a> {
    pub fn new(backend: &'a dyn AiBackend, ai: &'a AiConfig, extraction: &ExtractionConfig) -> Self {
        Self {
            backend,
            config: ai,
            validator: CandidateValidator::new(extraction),
            sign: SignPolicy::new(),
        }
    }

    /// Extract candidates from the whole document text.
    ///
    /// A chunk whose request fails or whose response cannot be read
    /// contributes nothing; the remaining chunks are still processed.
    pub fn parse_ai(&self, text: &str, bank: BankLabel, credential: &str) -> Result<Vec<TransactionCandidate>> {
        if credential.trim().is_empty() {
            return Err(AiError::MissingCredential.into());
        }

        let chunks = chunk_text(text, self.config.max_chunk_chars());
        if chunks.is_empty() {
            return Err(ExtractionError::NoText.into());
        }

        info!("AI extraction over {} chunks", chunks.len());
        let total = chunks.len();
        let mut candidates = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            let found = self.parse_chunk(chunk, bank, index + 1, total, credential);
            debug!("chunk {}/{}: {} candidates", index + 1, total, found.len());
            candidates.extend(found);
        }

        Ok(candidates)
    }

    fn parse_chunk(
        &self,
        chunk: &str,
        bank: BankLabel,
        number: usize,
        total: usize,
        credential: &str,
    ) -> Vec<TransactionCandidate> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            system: Some(EXTRACTION_SYSTEM.to_string()),
            prompt: extraction_prompt(chunk, bank, number, total),
            max_tokens: self.config.max_response_tokens,
            temperature: self.config.temperature,
        };

        let content = match self.backend.complete(credential, &request) {
            Ok(content) => content,
            Err(e) => {
                warn!("chunk {}/{}: AI request failed: {}", number, total, e);
                return Vec::new();
            }
        };

        let candidates = match parse_response(&content) {
            Ok(candidates) => candidates,
            Err(e) => {
                debug!("chunk {}/{}: {}, trying line recovery", number, total, e);
                recover_from_text(&content, &self.sign)
            }
        };

        candidates
            .into_iter()
            .filter(|c| self.validator.accepts(c))
            .collect()
    }
}
