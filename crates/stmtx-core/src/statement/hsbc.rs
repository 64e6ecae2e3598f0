//! HSBC statement parser with tiered escalation for noisy OCR text.
//!
//! Tier 1 requires both dates, tier 2 accepts a single date with trailing
//! text, tier 3 finds signed amounts and dates independently. A tier only
//! runs when the previous one found nothing in the whole document.

use regex::Regex;
use tracing::{debug, trace};

use super::rules::patterns::{
    DATE_ANYWHERE, HSBC_FLEXIBLE, ONE_DATE_SIGNED, SIGNED_AMOUNT, TWO_DATES_SIGNED,
};
use super::rules::{
    LineTemplate, SignPolicy, clean_description, fix_ocr_digits, match_first, parse_amount,
};
use super::{Result, TransactionParser};
use crate::models::TransactionCandidate;

/// Lines searched above an amount for its date.
const DATE_LOOKBACK_LINES: usize = 3;

/// HSBC parser.
pub struct HsbcParser {
    strict: Vec<LineTemplate>,
    flexible: Vec<LineTemplate>,
    sign: SignPolicy,
}

impl HsbcParser {
    pub fn new() -> Self {
        Self {
            strict: vec![LineTemplate::new("hsbc_two_dates", &TWO_DATES_SIGNED)],
            flexible: vec![
                LineTemplate::new("hsbc_one_date", &ONE_DATE_SIGNED),
                LineTemplate::new("hsbc_flexible", &HSBC_FLEXIBLE),
            ],
            sign: SignPolicy::new().with_credit_keywords(&["pago recibido spei", "abono spei"]),
        }
    }

    fn parse_with_templates(&self, lines: &[String], templates: &[LineTemplate]) -> Vec<TransactionCandidate> {
        lines
            .iter()
            .filter_map(|line| match_first(templates, line))
            .filter_map(|(_, matched)| matched.into_candidate(&self.sign).ok())
            .collect()
    }

    /// Associate each signed amount with the nearest date on its line or on
    /// one of the preceding lines.
    fn parse_decoupled(&self, lines: &[String]) -> Vec<TransactionCandidate> {
        let mut candidates = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let Some(amount_caps) = SIGNED_AMOUNT.captures(line) else {
                continue;
            };
            let Some(amount_match) = amount_caps.get(0) else {
                continue;
            };
            let sign = amount_caps.name("sign").and_then(|m| m.as_str().chars().next());
            let Ok(magnitude) = parse_amount(&amount_caps["amount"]) else {
                continue;
            };

            let same_line_date = DATE_ANYWHERE
                .find_iter(line)
                .min_by_key(|m| span_gap(m.range(), amount_match.range()));

            let (date, mut description) = match same_line_date {
                Some(date) => (
                    date.as_str().to_string(),
                    strip_fields(line, amount_match.range()),
                ),
                None => {
                    let Some((date, source)) = preceding_date(lines, index) else {
                        trace!("hsbc: no date near amount on line {}", index + 1);
                        continue;
                    };
                    let description = strip_fields(line, amount_match.range());
                    let description = if description.is_empty() {
                        strip_fields(source, 0..0)
                    } else {
                        description
                    };
                    (date, description)
                }
            };

            description = clean_description(&description);
            if description.is_empty() {
                continue;
            }

            let amount = self.sign.resolve(sign, magnitude, &description);
            candidates.push(TransactionCandidate::new(date, description, amount));
        }

        candidates
    }
}

impl Default for HsbcParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionParser for HsbcParser {
    fn name(&self) -> &str {
        "bank:HSBC"
    }

    fn parse(&self, text: &str) -> Result<Vec<TransactionCandidate>> {
        let lines: Vec<String> = text.lines().map(|l| fix_ocr_digits(l).into_owned()).collect();

        let strict = self.parse_with_templates(&lines, &self.strict);
        if !strict.is_empty() {
            debug!("hsbc: strict tier found {} candidates", strict.len());
            return Ok(strict);
        }

        let flexible = self.parse_with_templates(&lines, &self.flexible);
        if !flexible.is_empty() {
            debug!("hsbc: flexible tier found {} candidates", flexible.len());
            return Ok(flexible);
        }

        let decoupled = self.parse_decoupled(&lines);
        debug!("hsbc: decoupled tier found {} candidates", decoupled.len());
        Ok(decoupled)
    }
}

/// Closest date on the lines above `index`, with the line it came from.
fn preceding_date(lines: &[String], index: usize) -> Option<(String, &str)> {
    (1..=DATE_LOOKBACK_LINES)
        .filter_map(|back| index.checked_sub(back))
        .find_map(|i| {
            DATE_ANYWHERE
                .find_iter(&lines[i])
                .last()
                .map(|m| (m.as_str().to_string(), lines[i].as_str()))
        })
}

/// Characters between two non-overlapping spans, zero when they overlap.
fn span_gap(a: std::ops::Range<usize>, b: std::ops::Range<usize>) -> usize {
    if a.end <= b.start {
        b.start - a.end
    } else if b.end <= a.start {
        a.start - b.end
    } else {
        0
    }
}

/// Line text without the given span and without any dates.
fn strip_fields(line: &str, span: std::ops::Range<usize>) -> String {
    let mut text = String::with_capacity(line.len());
    text.push_str(&line[..span.start]);
    text.push(' ');
    text.push_str(&line[span.end..]);
    remove_all(&DATE_ANYWHERE, &text)
}

fn remove_all(pattern: &Regex, text: &str) -> String {
    pattern.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_strict_tier() {
        let text = "04-Jun-2025  04-Jun-2025  SU PAGO GRACIAS SPEI A CTA CLABE XXXXXXXX1179  + $9,153.00\n\
                    06-Jun-2025  UBER TRIP  - $85.50 MXN";
        let candidates = HsbcParser::new().parse(text).unwrap();
        // The strict tier found a row, so the looser second row is not picked up.
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].amount, dec("9153.00"));
    }

    #[test]
    fn test_flexible_tier_accepts_trailing_text() {
        let text = "06-Jun-2025  UBER TRIP  - $85.50 MXN";
        let candidates = HsbcParser::new().parse(text).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].description, "UBER TRIP");
        assert_eq!(candidates[0].amount, dec("-85.50"));
    }

    #[test]
    fn test_decoupled_tier_looks_back_for_date() {
        let text = "O7-Jun-2O25\n\
                    REF 0045\n\
                    RESTAURANTE PIZZA HUT  - $ 3l2.OO";
        let candidates = HsbcParser::new().parse(text).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].operation_date, "07-Jun-2025");
        assert_eq!(candidates[0].description, "RESTAURANTE PIZZA HUT");
        assert_eq!(candidates[0].amount, dec("-312.00"));
    }

    #[test]
    fn test_decoupled_tier_gives_up_beyond_lookback() {
        let text = "07-Jun-2025\nA\nB\nC\nCOMPRA  - $10.00";
        assert!(HsbcParser::new().parse(text).unwrap().is_empty());
    }

    #[test]
    fn test_decoupled_amount_before_date() {
        let text = "+ $1,200.00 DEPOSITO 08-Jun-2025 SUCURSAL";
        let candidates = HsbcParser::new().parse(text).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].description, "DEPOSITO SUCURSAL");
        assert_eq!(candidates[0].amount, dec("1200.00"));
    }

    #[test]
    fn test_decoupled_picks_date_closest_to_amount() {
        let lines = vec!["01-Jun-2025 CAFE - $150.00 02-Jun-2025".to_string()];
        let candidates = HsbcParser::new().parse_decoupled(&lines);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].operation_date, "02-Jun-2025");
        assert_eq!(candidates[0].description, "CAFE");
        assert_eq!(candidates[0].amount, dec("-150.00"));
    }

    #[test]
    fn test_span_gap() {
        assert_eq!(span_gap(0..11, 17..26), 6);
        assert_eq!(span_gap(27..38, 17..26), 1);
        assert_eq!(span_gap(5..20, 10..12), 0);
    }
}
