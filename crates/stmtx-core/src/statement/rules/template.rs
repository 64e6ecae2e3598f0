//! Ordered line templates.

use regex::Regex;

use super::amounts::parse_amount;
use super::patterns::{
    BANORTE_BALANCE, BBVA_OPER_LIQ, ONE_DATE_LOOSE, ONE_DATE_SIGNED, SANTANDER_FOLIO,
    TWO_DATES_BARE, TWO_DATES_SIGNED, WHITESPACE,
};
use super::sign::SignPolicy;
use crate::error::NormalizeError;
use crate::models::TransactionCandidate;

/// A named line pattern.
#[derive(Debug, Clone, Copy)]
pub struct LineTemplate {
    pub name: &'static str,
    pub pattern: &'static Regex,
}

/// Fields captured from one statement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub operation_date: String,
    pub charge_date: Option<String>,
    pub description: String,
    pub sign: Option<char>,
    pub amount: String,
}

impl LineTemplate {
    pub const fn new(name: &'static str, pattern: &'static Regex) -> Self {
        Self { name, pattern }
    }

    /// Capture the line, if it matches.
    pub fn captures(&self, line: &str) -> Option<LineMatch> {
        let caps = self.pattern.captures(line)?;
        Some(LineMatch {
            operation_date: caps.name("op")?.as_str().to_string(),
            charge_date: caps.name("charge").map(|m| m.as_str().to_string()),
            description: clean_description(caps.name("desc")?.as_str()),
            sign: caps.name("sign").and_then(|m| m.as_str().chars().next()),
            amount: caps.name("amount")?.as_str().to_string(),
        })
    }
}

impl LineMatch {
    /// Build a candidate, fixing the amount sign with the given policy.
    pub fn into_candidate(self, policy: &SignPolicy) -> Result<TransactionCandidate, NormalizeError> {
        let magnitude = parse_amount(&self.amount)?;
        let amount = policy.resolve(self.sign, magnitude, &self.description);

        let candidate = TransactionCandidate::new(self.operation_date, self.description, amount);
        Ok(match self.charge_date {
            Some(charge) => candidate.with_charge_date(charge),
            None => candidate,
        })
    }
}

/// First template matching the line, in list order.
pub fn match_first(templates: &[LineTemplate], line: &str) -> Option<(&'static str, LineMatch)> {
    templates
        .iter()
        .find_map(|t| t.captures(line).map(|m| (t.name, m)))
}

/// Collapse whitespace runs and trim.
pub fn clean_description(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Generic templates, most specific first.
pub fn generic_templates() -> Vec<LineTemplate> {
    vec![
        LineTemplate::new("two_dates_signed", &TWO_DATES_SIGNED),
        LineTemplate::new("one_date_signed", &ONE_DATE_SIGNED),
        LineTemplate::new("two_dates_bare", &TWO_DATES_BARE),
        LineTemplate::new("one_date_loose", &ONE_DATE_LOOSE),
    ]
}

pub fn santander_templates() -> Vec<LineTemplate> {
    vec![LineTemplate::new("santander_folio", &SANTANDER_FOLIO)]
}

pub fn bbva_templates() -> Vec<LineTemplate> {
    vec![LineTemplate::new("bbva_oper_liq", &BBVA_OPER_LIQ)]
}

pub fn banorte_templates() -> Vec<LineTemplate> {
    vec![LineTemplate::new("banorte_balance", &BANORTE_BALANCE)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_specific_template_wins() {
        let line = "04-Jun-2025  04-Jun-2025  SU PAGO GRACIAS SPEI A CTA CLABE XXXXXXXX1179  + $9,153.00";
        let (name, m) = match_first(&generic_templates(), line).unwrap();
        assert_eq!(name, "two_dates_signed");
        assert_eq!(
            m,
            LineMatch {
                operation_date: "04-Jun-2025".to_string(),
                charge_date: Some("04-Jun-2025".to_string()),
                description: "SU PAGO GRACIAS SPEI A CTA CLABE XXXXXXXX1179".to_string(),
                sign: Some('+'),
                amount: "9,153.00".to_string(),
            }
        );
    }

    #[test]
    fn test_into_candidate_negates_charges() {
        let line = "05-Jun-2025  COMPRA TARJETA OXXO MONTERREY  - $150.00";
        let (name, m) = match_first(&generic_templates(), line).unwrap();
        assert_eq!(name, "one_date_signed");

        let candidate = m.into_candidate(&SignPolicy::new()).unwrap();
        assert_eq!(candidate.amount, Decimal::from_str("-150.00").unwrap());
        assert_eq!(candidate.charge_date, "05-Jun-2025");
    }

    #[test]
    fn test_no_template_matches_header() {
        assert!(match_first(&generic_templates(), "FECHA  DESCRIPCION  MONTO").is_none());
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description("  PAGO \t SPEI   ABC "), "PAGO SPEI ABC");
    }
}
