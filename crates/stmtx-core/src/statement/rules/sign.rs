//! Credit/charge sign resolution.

use rust_decimal::Decimal;

/// Description keywords that mark money coming into the account.
const CREDIT_KEYWORDS: &[&str] = &[
    "su pago",
    "pago recibido",
    "abono",
    "deposito",
    "depósito",
    "spei recibido",
    "transferencia recibida",
    "traspaso recibido",
    "devolucion",
    "devolución",
    "reembolso",
    "bonificacion",
    "bonificación",
    "nomina",
    "nómina",
    "payment received",
    "deposit",
    "refund",
];

/// Decides the sign of an amount from an explicit marker or, when the
/// statement prints none, from the description.
///
/// Keyword inference is best-effort: an ambiguous description defaults to a
/// charge.
#[derive(Debug, Clone)]
pub struct SignPolicy {
    credit_keywords: Vec<&'static str>,
}

impl SignPolicy {
    /// Policy with the common credit keywords.
    pub fn new() -> Self {
        Self {
            credit_keywords: CREDIT_KEYWORDS.to_vec(),
        }
    }

    /// Add bank-specific credit keywords (lowercase).
    pub fn with_credit_keywords(mut self, keywords: &[&'static str]) -> Self {
        self.credit_keywords.extend_from_slice(keywords);
        self
    }

    /// Whether the description reads as a credit.
    pub fn is_credit(&self, description: &str) -> bool {
        let folded = description.to_lowercase();
        self.credit_keywords.iter().any(|k| folded.contains(k))
    }

    /// Apply the charges-negative convention to an amount magnitude.
    pub fn resolve(&self, sign: Option<char>, amount: Decimal, description: &str) -> Decimal {
        let magnitude = amount.abs();
        let credit = match sign {
            Some('+') => true,
            Some('-') => false,
            _ => self.is_credit(description),
        };
        if credit { magnitude } else { -magnitude }
    }
}

impl Default for SignPolicy {
    fn default() -> Self {
        Self::new()
    }
}
