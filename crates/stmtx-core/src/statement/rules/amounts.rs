//! Amount parsing for statement text.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::NormalizeError;

/// Parse an amount such as "$9,153.00", "- $150.00", "1,234.50 MXN" or "150.00-".
///
/// Thousands separators, currency markers and whitespace are stripped. A
/// leading or trailing `-` makes the result negative.
pub fn parse_amount(raw: &str) -> Result<Decimal, NormalizeError> {
    let invalid = || NormalizeError::Amount {
        value: raw.to_string(),
    };

    let trimmed = raw.trim();
    let negative = trimmed.starts_with('-') || trimmed.ends_with('-');

    let digits: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if digits.is_empty() || digits.matches('.').count() > 1 {
        return Err(invalid());
    }

    let magnitude = Decimal::from_str(&digits).map_err(|_| invalid())?;
    Ok(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("$9,153.00").unwrap(), dec("9153.00"));
        assert_eq!(parse_amount("- $150.00").unwrap(), dec("-150.00"));
        assert_eq!(parse_amount("1,234,567.89 MXN").unwrap(), dec("1234567.89"));
        assert_eq!(parse_amount("150.00-").unwrap(), dec("-150.00"));
        assert_eq!(parse_amount("+ $ 20").unwrap(), dec("20"));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(matches!(parse_amount("N/A"), Err(NormalizeError::Amount { .. })));
        assert!(parse_amount("").is_err());
        assert!(parse_amount("1.2.3").is_err());
    }
}
