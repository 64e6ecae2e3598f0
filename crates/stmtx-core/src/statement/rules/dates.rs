//! Date normalization for statement text.

use chrono::NaiveDate;

use crate::error::NormalizeError;

/// Spanish month abbreviations mapped to their English counterparts.
const SPANISH_MONTHS: &[(&str, &str)] = &[
    ("ene", "jan"),
    ("feb", "feb"),
    ("mar", "mar"),
    ("abr", "apr"),
    ("may", "may"),
    ("jun", "jun"),
    ("jul", "jul"),
    ("ago", "aug"),
    ("sep", "sep"),
    ("set", "sep"),
    ("oct", "oct"),
    ("nov", "nov"),
    ("dic", "dec"),
];

/// Formats tried in order once the text is in canonical `d-m-Y` form.
const MONTH_NAME_FORMATS: &[&str] = &["%d-%b-%Y"];
const NUMERIC_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

/// Parse a statement date.
///
/// Tries abbreviated month names (Spanish first, mapped to English, then
/// English), then numeric day-month-year, day/month/year and ISO dates.
/// Two-digit years are read as 20xx.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, NormalizeError> {
    let trimmed = raw.trim();

    if let Some(canonical) = month_name_form(trimmed) {
        for format in MONTH_NAME_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(&canonical, format) {
                return Ok(date);
            }
        }
    }

    let expanded = expand_short_year(trimmed);
    for format in NUMERIC_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&expanded, format) {
            return Ok(date);
        }
    }

    Err(NormalizeError::Date {
        value: raw.to_string(),
    })
}

/// Rewrite "04/JUN/25", "4 jun 2025" or "04-Sept-2025" as "04-jun-2025".
fn month_name_form(text: &str) -> Option<String> {
    let parts: Vec<&str> = text
        .split(['-', '/', ' ', '.'])
        .filter(|p| !p.is_empty())
        .collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };

    if !month.chars().all(char::is_alphabetic) || month.chars().count() < 3 {
        return None;
    }

    let prefix: String = month.to_lowercase().chars().take(3).collect();
    let english = SPANISH_MONTHS
        .iter()
        .find(|(spanish, _)| *spanish == prefix)
        .map(|(_, english)| english.to_string())
        .unwrap_or(prefix);

    Some(format!("{}-{}-{}", day, english, full_year(year)))
}

/// Expand a trailing two-digit year ("04-06-25" becomes "04-06-2025").
fn expand_short_year(text: &str) -> String {
    let year_first = text
        .split(['-', '/'])
        .next()
        .is_some_and(|first| first.len() == 4);
    if year_first {
        return text.to_string();
    }

    match text.rfind(['-', '/']) {
        Some(pos) if text.len() - pos - 1 == 2 && text[pos + 1..].chars().all(|c| c.is_ascii_digit()) => {
            format!("{}20{}", &text[..=pos], &text[pos + 1..])
        }
        _ => text.to_string(),
    }
}

fn full_year(year: &str) -> String {
    if year.len() == 2 && year.chars().all(|c| c.is_ascii_digit()) {
        format!("20{}", year)
    } else {
        year.to_string()
    }
}
