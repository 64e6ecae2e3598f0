//! Correction of OCR letter/digit confusions in numeric tokens.

use std::borrow::Cow;

use super::patterns::OCR_NUMERIC_TOKEN;

/// Replace look-alike letters inside numeric tokens: O/o→0, S→5, l/I→1, B→8.
///
/// Only tokens that already contain a digit are touched, so words are left
/// alone.
pub fn fix_ocr_digits(line: &str) -> Cow<'_, str> {
    OCR_NUMERIC_TOKEN.replace_all(line, |caps: &regex::Captures| {
        let token = &caps[0];
        if !token.chars().any(|c| c.is_ascii_digit()) {
            return token.to_string();
        }
        token
            .chars()
            .map(|c| match c {
                'O' | 'o' => '0',
                'S' => '5',
                'l' | 'I' => '1',
                'B' => '8',
                other => other,
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixes_amounts_and_dates() {
        assert_eq!(fix_ocr_digits("- $1,5OO.OO"), "- $1,500.00");
        assert_eq!(fix_ocr_digits("O4-Jun-2O25 OXXO"), "04-Jun-2025 OXXO");
        assert_eq!(fix_ocr_digits("1l.B0"), "11.80");
    }

    #[test]
    fn test_leaves_words_alone() {
        assert_eq!(fix_ocr_digits("SOS BIO OXXO"), "SOS BIO OXXO");
    }
}
