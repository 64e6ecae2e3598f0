//! Final-fallback AI extraction over large text windows.

use tracing::{debug, info, warn};

use super::parser::{parse_response, recover_from_text};
use super::prompts::legacy_prompt;
use super::validate::CandidateValidator;
use super::{AiBackend, CompletionRequest};
use crate::error::{AiError, ExtractionError, Result};
use crate::models::TransactionCandidate;
use crate::models::config::{AiConfig, ExtractionConfig};
use crate::statement::rules::SignPolicy;

/// Single-prompt extraction with strict per-transaction validation.
///
/// Sends the first window of the document; when that yields nothing and the
/// document is longer, sends overlapping windows across the rest of it.
pub struct LegacyAiExtractor<'a> {
    backend: &'a dyn AiBackend,
    config: &'a AiConfig,
    validator: CandidateValidator,
}

impl<'a> LegacyAiExtractor<'a> {
    pub fn new(backend: &'a dyn AiBackend, ai: &'a AiConfig, extraction: &ExtractionConfig) -> Self {
        Self {
            backend,
            config: ai,
            validator: CandidateValidator::new(extraction).strict(),
        }
    }

    pub fn extract(&self, text: &str, credential: &str) -> Result<Vec<TransactionCandidate>> {
        if credential.trim().is_empty() {
            return Err(AiError::MissingCredential.into());
        }

        let chars: Vec<char> = text.chars().collect();
        if chars.iter().all(|c| c.is_whitespace()) {
            return Err(ExtractionError::NoText.into());
        }

        let width = self.config.legacy_window_chars.max(1);
        let step = self.config.legacy_window_step.max(1);

        let first: String = chars.iter().take(width).collect();
        let found = self.extract_window(&first, credential);
        if !found.is_empty() || chars.len() <= width {
            return Ok(found);
        }

        info!("legacy extraction found nothing in the first window, scanning the whole text");
        let mut candidates = Vec::new();
        let mut start = step;
        while start < chars.len() {
            let end = (start + width).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            candidates.extend(self.extract_window(&window, credential));
            if end == chars.len() {
                break;
            }
            start += step;
        }

        Ok(candidates)
    }

    fn extract_window(&self, window: &str, credential: &str) -> Vec<TransactionCandidate> {
        let request = CompletionRequest {
            model: self.config.legacy_model.clone(),
            system: None,
            prompt: legacy_prompt(window),
            max_tokens: self.config.legacy_max_response_tokens,
            temperature: 0.0,
        };

        let content = match self.backend.complete(credential, &request) {
            Ok(content) => content,
            Err(e) => {
                warn!("legacy AI request failed: {}", e);
                return Vec::new();
            }
        };

        let candidates = parse_response(&content)
            .unwrap_or_else(|_| recover_from_text(&content, &SignPolicy::new()));

        let accepted: Vec<_> = candidates
            .into_iter()
            .filter(|c| self.validator.accepts(c))
            .collect();
        debug!("legacy window: {} accepted candidates", accepted.len());
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct CountingBackend {
        answers: Vec<&'static str>,
        calls: RefCell<Vec<usize>>,
    }

    impl AiBackend for CountingBackend {
        fn complete(&self, _credential: &str, request: &CompletionRequest) -> std::result::Result<String, AiError> {
            let mut calls = self.calls.borrow_mut();
            calls.push(request.prompt.len());
            let answer = self.answers.get(calls.len() - 1).copied().unwrap_or("[]");
            Ok(answer.to_string())
        }
    }

    const FOUND: &str = r#"[{"fecha_operacion": "05-Jun-2025", "descripcion": "COMISION ANUAL", "monto": -600.00}]"#;

    fn small_windows() -> AiConfig {
        AiConfig {
            legacy_window_chars: 10,
            legacy_window_step: 8,
            ..AiConfig::default()
        }
    }

    #[test]
    fn test_first_window_success_stops() {
        let backend = CountingBackend {
            answers: vec![FOUND],
            calls: RefCell::new(Vec::new()),
        };
        let ai = small_windows();
        let extraction = ExtractionConfig::default();
        let extractor = LegacyAiExtractor::new(&backend, &ai, &extraction);

        let found = extractor.extract(&"x".repeat(40), "sk").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(backend.calls.borrow().len(), 1);
    }

    #[test]
    fn test_windows_scan_rest_of_text() {
        // 26 chars, width 10, step 8: windows at 0, 8, 16
        let backend = CountingBackend {
            answers: vec!["[]", "[]", FOUND],
            calls: RefCell::new(Vec::new()),
        };
        let ai = small_windows();
        let extraction = ExtractionConfig::default();
        let extractor = LegacyAiExtractor::new(&backend, &ai, &extraction);

        let found = extractor.extract(&"x".repeat(26), "sk").unwrap();
        assert_eq!(backend.calls.borrow().len(), 3);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_strict_validation_drops_bad_dates() {
        let backend = CountingBackend {
            answers: vec![r#"[{"fecha_operacion": "N/A", "descripcion": "COMISION", "monto": -600}]"#],
            calls: RefCell::new(Vec::new()),
        };
        let ai = AiConfig::default();
        let extraction = ExtractionConfig::default();
        let extractor = LegacyAiExtractor::new(&backend, &ai, &extraction);

        assert!(extractor.extract("short text", "sk").unwrap().is_empty());
    }
}
