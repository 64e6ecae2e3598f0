//! Acceptance checks for AI-produced candidates.

use rust_decimal::Decimal;
use tracing::trace;

use crate::models::TransactionCandidate;
use crate::models::config::ExtractionConfig;
use crate::statement::rules::normalize_date;
use crate::statement::rules::patterns::PERCENTAGE;

/// Descriptions containing any of these are statement boilerplate, not
/// transactions (case-folded).
const EXCLUDED_PHRASES: &[&str] = &[
    "tasa de interes",
    "tasa de interés",
    "tasa anual",
    "cat promedio",
    "saldo anterior",
    "saldo final",
    "saldo al corte",
    "saldo actual",
    "saldo promedio",
    "saldo deudor",
    "pago minimo",
    "pago mínimo",
    "pago para no generar intereses",
    "limite de credito",
    "límite de crédito",
    "credito disponible",
    "crédito disponible",
    "total de cargos",
    "total de abonos",
    "total cargos",
    "total abonos",
    "interest rate",
    "previous balance",
    "new balance",
    "minimum payment",
    "credit limit",
];

/// Checks applied to every AI candidate before it is accepted.
#[derive(Debug, Clone)]
pub struct CandidateValidator {
    min_amount: Decimal,
    min_description_len: usize,
    strict: bool,
}

impl CandidateValidator {
    /// Validator using the configured thresholds.
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            min_amount: config.min_amount,
            min_description_len: config.min_description_len,
            strict: false,
        }
    }

    /// Additionally require a parseable date and a description with letters.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Whether the candidate passes every check.
    pub fn accepts(&self, candidate: &TransactionCandidate) -> bool {
        match self.rejection(candidate) {
            Some(reason) => {
                trace!("rejected '{}': {}", candidate.description, reason);
                false
            }
            None => true,
        }
    }

    fn rejection(&self, candidate: &TransactionCandidate) -> Option<&'static str> {
        if candidate.amount.abs() < self.min_amount {
            return Some("amount below threshold");
        }

        let description = candidate.description.trim();
        if description.chars().count() <= self.min_description_len {
            return Some("description too short");
        }

        let folded = description.to_lowercase();
        if EXCLUDED_PHRASES.iter().any(|p| folded.contains(p)) {
            return Some("excluded phrase");
        }
        if PERCENTAGE.is_match(description) {
            return Some("percentage annotation");
        }

        if self.strict {
            if !description.chars().any(char::is_alphabetic) {
                return Some("description has no letters");
            }
            if normalize_date(&candidate.operation_date).is_err() {
                return Some("unparseable date");
            }
        }

        None
    }
}
