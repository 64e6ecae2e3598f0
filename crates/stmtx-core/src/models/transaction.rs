//! Transaction data models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category assigned when no parser or rule supplied one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// A transaction as produced by a single parser strategy, before normalization.
///
/// Dates stay in the statement's own format. The amount already follows the
/// charges-negative / credits-positive convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionCandidate {
    /// Operation date, as printed.
    pub operation_date: String,

    /// Charge (posting) date, as printed. Equal to the operation date when absent.
    pub charge_date: String,

    /// Free-text description.
    pub description: String,

    /// Signed amount.
    pub amount: Decimal,

    /// Category or [`UNCATEGORIZED`].
    pub category: String,
}

impl TransactionCandidate {
    /// Create a candidate whose charge date equals its operation date.
    pub fn new(
        operation_date: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        let operation_date = operation_date.into();
        Self {
            charge_date: operation_date.clone(),
            operation_date,
            description: description.into(),
            amount,
            category: UNCATEGORIZED.to_string(),
        }
    }

    /// Set the charge date.
    pub fn with_charge_date(mut self, charge_date: impl Into<String>) -> Self {
        self.charge_date = charge_date.into();
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

/// Direction of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money leaving the account ("cargo").
    Charge,
    /// Payment or deposit received ("abono").
    Credit,
}

impl TransactionKind {
    /// Kind implied by the sign of a normalized amount.
    pub fn from_amount(amount: Decimal) -> Self {
        if amount.is_sign_negative() {
            TransactionKind::Charge
        } else {
            TransactionKind::Credit
        }
    }

    /// Statement-language label.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Charge => "cargo",
            TransactionKind::Credit => "abono",
        }
    }
}

/// A normalized transaction returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Operation date.
    pub date: NaiveDate,

    /// Charge (posting) date, when it parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_date: Option<NaiveDate>,

    /// Non-empty description.
    pub description: String,

    /// Non-zero amount; charges are negative.
    pub amount: Decimal,

    /// Charge or credit, derived from the amount sign.
    pub kind: TransactionKind,

    /// Category.
    pub category: String,
}

impl TransactionRecord {
    /// Whether the record still carries the placeholder category.
    pub fn is_uncategorized(&self) -> bool {
        let category = self.category.trim();
        category.is_empty()
            || category.eq_ignore_ascii_case(UNCATEGORIZED)
            || category.eq_ignore_ascii_case("auto_categorized")
            || category.eq_ignore_ascii_case("auto_categorized_category")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_candidate_defaults() {
        let candidate = TransactionCandidate::new("04-Jun-2025", "OXXO", Decimal::from(-150));
        assert_eq!(candidate.charge_date, "04-Jun-2025");
        assert_eq!(candidate.category, UNCATEGORIZED);
    }

    #[test]
    fn test_kind_from_amount() {
        assert_eq!(
            TransactionKind::from_amount(Decimal::from_str("-0.50").unwrap()),
            TransactionKind::Charge
        );
        assert_eq!(TransactionKind::from_amount(Decimal::from(20)), TransactionKind::Credit);
        assert_eq!(TransactionKind::Charge.label(), "cargo");
    }
}
