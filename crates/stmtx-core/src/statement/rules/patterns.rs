//! Common regex patterns for statement line parsing.
//!
//! Line templates use the named groups `op`, `charge`, `desc`, `sign` and
//! `amount`; only `op`, `desc` and `amount` are mandatory.

use lazy_static::lazy_static;
use regex::Regex;

/// Day, month (number or 3-4 letter abbreviation) and year.
pub const DATE: &str = r"\d{1,2}[-/](?:[A-Za-z]{3,4}|\d{1,2})[-/]\d{2,4}";

/// Amount with optional thousands separators and optional cents.
pub const AMOUNT: &str = r"(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?";

/// Amount that must carry cents (a bare decimal).
pub const AMOUNT_DEC: &str = r"(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}";

lazy_static! {
    // Generic templates, most specific first

    /// Two dates, description, explicit sign and `$` amount.
    pub static ref TWO_DATES_SIGNED: Regex = Regex::new(&format!(
        r"^\s*(?P<op>{DATE})\s+(?P<charge>{DATE})\s+(?P<desc>.+?)\s+(?P<sign>[+-])\s*\$\s*(?P<amount>{AMOUNT})\s*$"
    )).unwrap();

    /// One date, description, explicit sign and `$` amount.
    pub static ref ONE_DATE_SIGNED: Regex = Regex::new(&format!(
        r"^\s*(?P<op>{DATE})\s+(?P<desc>.+?)\s+(?P<sign>[+-])\s*\$\s*(?P<amount>{AMOUNT})\s*$"
    )).unwrap();

    /// Two dates, description, optional sign and a bare decimal.
    pub static ref TWO_DATES_BARE: Regex = Regex::new(&format!(
        r"^\s*(?P<op>{DATE})\s+(?P<charge>{DATE})\s+(?P<desc>.+?)\s+(?:(?P<sign>[+-])\s*)?(?P<amount>{AMOUNT_DEC})\s*$"
    )).unwrap();

    /// One date, description, optional sign, optional `$` and an amount.
    pub static ref ONE_DATE_LOOSE: Regex = Regex::new(&format!(
        r"^\s*(?P<op>{DATE})\s+(?P<desc>.+?)\s+(?:(?P<sign>[+-])\s*)?\$?\s*(?P<amount>{AMOUNT_DEC})\s*$"
    )).unwrap();

    // Bank layouts

    /// Date, folio, description, amount and running balance.
    pub static ref SANTANDER_FOLIO: Regex = Regex::new(&format!(
        r"^\s*(?P<op>{DATE})\s+\d{{5,}}\s+(?P<desc>.+?)\s+\$?\s*(?P<amount>{AMOUNT_DEC})\s+\$?\s*{AMOUNT_DEC}\s*$"
    )).unwrap();

    /// Operation and settlement dates, description, amount and optional balance.
    pub static ref BBVA_OPER_LIQ: Regex = Regex::new(&format!(
        r"^\s*(?P<op>{DATE})\s+(?P<charge>{DATE})\s+(?P<desc>.+?)\s+(?:(?P<sign>[+-])\s*)?\$?\s*(?P<amount>{AMOUNT_DEC})(?:\s+\$?\s*{AMOUNT_DEC})?\s*$"
    )).unwrap();

    /// Date, description, amount and optional balance.
    pub static ref BANORTE_BALANCE: Regex = Regex::new(&format!(
        r"^\s*(?P<op>{DATE})\s+(?P<desc>.+?)\s+(?:(?P<sign>[+-])\s*)?\$?\s*(?P<amount>{AMOUNT_DEC})(?:\s+\$?\s*{AMOUNT_DEC})?\s*$"
    )).unwrap();

    // HSBC tiers

    /// Single date, description, sign and amount, trailing text tolerated.
    pub static ref HSBC_FLEXIBLE: Regex = Regex::new(&format!(
        r"^\s*(?P<op>{DATE})\s+(?P<desc>.+?)\s+(?P<sign>[+-])\s*\$?\s*(?P<amount>{AMOUNT_DEC})(?:\s.*)?$"
    )).unwrap();

    /// A signed `$` amount anywhere in a line.
    pub static ref SIGNED_AMOUNT: Regex = Regex::new(&format!(
        r"(?P<sign>[+-])\s*\$\s*(?P<amount>{AMOUNT})"
    )).unwrap();

    /// A date anywhere in a line.
    pub static ref DATE_ANYWHERE: Regex = Regex::new(&format!(r"\b{DATE}\b")).unwrap();

    // Free-form recovery (AI responses)

    /// `date - description - amount`.
    pub static ref RECOVER_DATE_DASH_DESC: Regex = Regex::new(&format!(
        r"(?i)(?P<op>{DATE})\s*[-–:]\s*(?P<desc>.+?)\s*[-–:]\s*(?P<sign>[+-])?\s*\$?\s*(?P<amount>{AMOUNT})\b"
    )).unwrap();

    /// `date description amount`.
    pub static ref RECOVER_DATE_DESC_AMOUNT: Regex = Regex::new(&format!(
        r"(?i)(?P<op>{DATE})\s+(?P<desc>.+?)\s+(?P<sign>[+-])?\s*\$?\s*(?P<amount>{AMOUNT_DEC})\b"
    )).unwrap();

    /// `description amount date`.
    pub static ref RECOVER_DESC_AMOUNT_DATE: Regex = Regex::new(&format!(
        r"(?i)(?P<desc>[A-Za-zÁÉÍÓÚÑáéíóúñ].*?)\s+(?P<sign>[+-])?\s*\$?\s*(?P<amount>{AMOUNT_DEC})\s+(?P<op>{DATE})"
    )).unwrap();

    // Normalization helpers

    /// Numeric token that may contain OCR letter/digit confusions.
    pub static ref OCR_NUMERIC_TOKEN: Regex = Regex::new(r"\b[0-9OoSlIB][0-9OoSlIB.,]*\b").unwrap();

    /// Percentage annotation such as "45.5%" or "3 %".
    pub static ref PERCENTAGE: Regex = Regex::new(r"\d+(?:[.,]\d+)?\s*%").unwrap();

    /// Runs of whitespace.
    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_fragment() {
        let date = Regex::new(&format!("^{DATE}$")).unwrap();
        assert!(date.is_match("04-Jun-2025"));
        assert!(date.is_match("4/06/25"));
        assert!(date.is_match("15-Sept-2024"));
        assert!(!date.is_match("2025-06-04"));
    }

    #[test]
    fn test_two_dates_signed() {
        let caps = TWO_DATES_SIGNED
            .captures("04-Jun-2025  04-Jun-2025  SU PAGO GRACIAS  + $9,153.00")
            .unwrap();
        assert_eq!(&caps["op"], "04-Jun-2025");
        assert_eq!(&caps["charge"], "04-Jun-2025");
        assert_eq!(&caps["desc"], "SU PAGO GRACIAS");
        assert_eq!(&caps["sign"], "+");
        assert_eq!(&caps["amount"], "9,153.00");
    }

    #[test]
    fn test_bare_amount_needs_cents() {
        assert!(ONE_DATE_LOOSE.is_match("05/06/2025 FARMACIA 120.50"));
        assert!(!ONE_DATE_LOOSE.is_match("05/06/2025 REFERENCIA 12345"));
    }

    #[test]
    fn test_santander_folio_line() {
        let caps = SANTANDER_FOLIO
            .captures("03-JUN-2025 1234567 DEPOSITO EN EFECTIVO 2,000.00 15,300.25")
            .unwrap();
        assert_eq!(&caps["desc"], "DEPOSITO EN EFECTIVO");
        assert_eq!(&caps["amount"], "2,000.00");
    }

    #[test]
    fn test_ocr_token() {
        let found: Vec<&str> = OCR_NUMERIC_TOKEN
            .find_iter("$1,5OO.OO CLABE XXXX1179")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["1,5OO.OO"]);
    }
}
