//! Deduplication and normalization of candidates into records.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::NormalizeError;
use crate::models::config::ExtractionConfig;
use crate::models::{TransactionCandidate, TransactionKind, TransactionRecord};
use crate::statement::rules::{clean_description, normalize_date};

/// Turns one strategy's candidates into caller-facing records.
#[derive(Debug, Clone)]
pub struct Finalizer {
    description_prefix: usize,
    min_description_len: usize,
}

impl Finalizer {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            description_prefix: config.dedup_description_prefix,
            min_description_len: config.min_description_len,
        }
    }

    /// Deduplicate (first occurrence wins, order kept), then normalize.
    /// Candidates that fail normalization are dropped with a warning.
    pub fn finalize(&self, candidates: &[TransactionCandidate]) -> Vec<TransactionRecord> {
        let mut seen: HashSet<(String, String, Decimal)> = HashSet::new();
        let mut records = Vec::new();

        for candidate in candidates {
            let key = self.dedup_key(candidate);
            if !seen.insert(key) {
                debug!("duplicate dropped: {} {}", candidate.operation_date, candidate.description);
                continue;
            }

            match self.normalize(candidate) {
                Ok(record) => records.push(record),
                Err(e) => warn!("dropping '{}': {}", candidate.description, e),
            }
        }

        records
    }

    fn dedup_key(&self, candidate: &TransactionCandidate) -> (String, String, Decimal) {
        let prefix: String = candidate
            .description
            .to_lowercase()
            .chars()
            .take(self.description_prefix)
            .collect();
        (
            candidate.operation_date.trim().to_string(),
            prefix,
            candidate.amount.normalize(),
        )
    }

    /// Normalize a single candidate.
    pub fn normalize(&self, candidate: &TransactionCandidate) -> Result<TransactionRecord, NormalizeError> {
        let date = normalize_date(&candidate.operation_date)?;
        let charge_date = normalize_date(&candidate.charge_date).ok();

        let amount = candidate.amount.round_dp(2);
        if amount.is_zero() {
            return Err(NormalizeError::ZeroAmount);
        }

        let description = clean_description(&candidate.description);
        if description.chars().count() <= self.min_description_len {
            return Err(NormalizeError::Description { value: description });
        }

        Ok(TransactionRecord {
            date,
            charge_date,
            description,
            amount,
            kind: TransactionKind::from_amount(amount),
            category: candidate.category.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn candidate(date: &str, description: &str, amount: &str) -> TransactionCandidate {
        TransactionCandidate::new(date, description, Decimal::from_str(amount).unwrap())
    }

    fn finalizer() -> Finalizer {
        Finalizer::new(&ExtractionConfig::default())
    }

    #[test]
    fn test_normalizes_examples() {
        let records = finalizer().finalize(&[
            candidate("04-Jun-2025", "SU PAGO GRACIAS SPEI A CTA CLABE XXXXXXXX1179", "9153.00"),
            candidate("05-Jun-2025", "COMPRA TARJETA OXXO MONTERREY", "-150.00"),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2025, 6, 4).unwrap());
        assert_eq!(records[0].amount, Decimal::from_str("9153.00").unwrap());
        assert_eq!(records[0].kind, TransactionKind::Credit);
        assert_eq!(records[1].amount, Decimal::from_str("-150.00").unwrap());
        assert_eq!(records[1].kind, TransactionKind::Charge);
    }

    #[test]
    fn test_duplicates_collapse_first_wins() {
        let first = candidate("05-Jun-2025", "OXXO MONTERREY", "-150.00").with_category("conveniencia");
        let second = candidate("05-Jun-2025", "oxxo monterrey", "-150.0").with_category("otros");
        let records = finalizer().finalize(&[first, second]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "OXXO MONTERREY");
        assert_eq!(records[0].category, "conveniencia");
    }

    #[test]
    fn test_prefix_limits_dedup_key() {
        let long_a = format!("{}A", "X".repeat(50));
        let long_b = format!("{}B", "X".repeat(50));
        let records = finalizer().finalize(&[
            candidate("05-Jun-2025", &long_a, "-10.00"),
            candidate("05-Jun-2025", &long_b, "-10.00"),
        ]);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_invalid_records_are_dropped() {
        let records = finalizer().finalize(&[
            candidate("not a date", "FARMACIA", "-10.00"),
            candidate("05-Jun-2025", "FARMACIA", "0.00"),
            candidate("05-Jun-2025", "AB", "-10.00"),
            candidate("06-Jun-2025", "FARMACIA", "-10.00"),
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2025, 6, 6).unwrap());
    }

    #[test]
    fn test_normalize_reports_date_error() {
        let err = finalizer().normalize(&candidate("31-Feb-2025", "FARMACIA", "-1")).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::Date {
                value: "31-Feb-2025".to_string()
            }
        );
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let candidates = vec![
            candidate("05-Jun-2025", "OXXO MONTERREY", "-150.00"),
            candidate("05-Jun-2025", "OXXO MONTERREY", "-150.00"),
            candidate("06-Jun-2025", "UBER TRIP", "-85.50"),
        ];
        let f = finalizer();
        assert_eq!(f.finalize(&candidates), f.finalize(&candidates));
    }

    #[test]
    fn test_output_keeps_insertion_order() {
        let records = finalizer().finalize(&[
            candidate("09-Jun-2025", "LATER", "-1.00"),
            candidate("01-Jun-2025", "EARLIER", "-1.00"),
        ]);
        assert_eq!(records[0].description, "LATER");
        assert_eq!(records[1].description, "EARLIER");
    }

    #[test]
    fn test_amount_rounding_to_zero_is_rejected() {
        let f = finalizer();
        let err = f
            .normalize(&candidate("05-Jun-2025", "COMISION REDONDEO", "0.004"))
            .unwrap_err();
        assert!(matches!(err, NormalizeError::ZeroAmount));

        let records = f.finalize(&[candidate("05-Jun-2025", "COMISION REDONDEO", "-0.004")]);
        assert!(records.is_empty());
    }
}
