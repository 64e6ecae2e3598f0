//! Line-template parser used for the generic strategy and bank profiles.

use std::borrow::Cow;

use tracing::{debug, trace};

use super::rules::{LineTemplate, SignPolicy, fix_ocr_digits, generic_templates, match_first};
use super::{Result, TransactionParser};
use crate::models::TransactionCandidate;

/// Tries an ordered template list on every line; the first match wins.
pub struct TemplateParser {
    name: String,
    templates: Vec<LineTemplate>,
    sign: SignPolicy,
    fix_ocr: bool,
}

impl TemplateParser {
    /// Create a parser from an ordered template list.
    pub fn new(name: impl Into<String>, templates: Vec<LineTemplate>) -> Self {
        Self {
            name: name.into(),
            templates,
            sign: SignPolicy::new(),
            fix_ocr: false,
        }
    }

    /// The bank-independent parser.
    pub fn generic() -> Self {
        Self::new("generic", generic_templates())
    }

    /// Set the sign policy.
    pub fn with_sign_policy(mut self, sign: SignPolicy) -> Self {
        self.sign = sign;
        self
    }

    /// Correct OCR digit confusions before matching.
    pub fn with_ocr_fix(mut self, enabled: bool) -> Self {
        self.fix_ocr = enabled;
        self
    }
}

impl TransactionParser for TemplateParser {
    fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, text: &str) -> Result<Vec<TransactionCandidate>> {
        let mut candidates = Vec::new();

        for line in text.lines() {
            let line: Cow<'_, str> = if self.fix_ocr {
                fix_ocr_digits(line)
            } else {
                Cow::Borrowed(line)
            };

            let Some((template, matched)) = match_first(&self.templates, &line) else {
                continue;
            };

            match matched.into_candidate(&self.sign) {
                Ok(candidate) => {
                    trace!("{}: '{}' matched {}", self.name, line.trim(), template);
                    candidates.push(candidate);
                }
                Err(e) => trace!("{}: skipping line: {}", self.name, e),
            }
        }

        debug!("{} parser found {} candidates", self.name, candidates.len());
        Ok(candidates)
    }
}
