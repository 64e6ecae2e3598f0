//! Transaction categorization.

use tracing::{debug, trace};

use crate::ai::{AiBackend, CompletionRequest};
use crate::ai::prompts::category_prompt;
use crate::models::config::AiConfig;

/// Every category a record can end up with.
pub const CATEGORIES: &[&str] = &[
    "ingreso",
    "retiro",
    "comision",
    "conveniencia",
    "restaurante",
    "transporte",
    "supermercado",
    "servicios",
    "entretenimiento",
    "otros",
];

/// Fallback category.
pub const OTHER: &str = "otros";

/// Keyword rules in priority order. Keywords match at the start of a word.
const RULES: &[(&str, &[&str])] = &[
    (
        "ingreso",
        &[
            "su pago", "deposito", "depósito", "abono", "nomina", "nómina", "spei recibido",
            "transferencia recibida", "devolucion", "devolución", "reembolso",
        ],
    ),
    ("retiro", &["retiro", "cajero", "atm", "disposicion", "disposición"]),
    ("comision", &["comision", "comisión", "anualidad", "iva com"]),
    ("conveniencia", &["oxxo", "seven eleven", "7 eleven", "circle k", "kiosko", "farmacia"]),
    (
        "restaurante",
        &[
            "restaurante", "rest ", "pizza", "starbucks", "mcdonald", "burger", "tacos", "cafe",
            "café", "uber eats", "rappi", "didi food", "sushi",
        ],
    ),
    (
        "transporte",
        &[
            "uber", "didi", "cabify", "gasolin", "pemex", "autopista", "caseta", "estacionamiento",
            "ipark", "aerobus", "volaris", "aeromexico", "metro",
        ],
    ),
    (
        "supermercado",
        &[
            "walmart", "soriana", "chedraui", "heb", "costco", "sams", "superama", "la comer",
            "bodega aurrera", "city market",
        ],
    ),
    (
        "servicios",
        &[
            "cfe", "telmex", "telcel", "izzi", "totalplay", "megacable", "at t", "agua", "gas natural",
            "pago servicio",
        ],
    ),
    (
        "entretenimiento",
        &[
            "netflix", "spotify", "cinepolis", "cinemex", "amazon prime", "disney", "hbo", "xbox",
            "playstation", "steam", "apple com",
        ],
    ),
];

/// Lowercase, turn punctuation into spaces and pad with spaces so a keyword
/// can be matched at a word start with `" keyword"`.
fn fold(description: &str) -> String {
    let mut folded = String::with_capacity(description.len() + 2);
    folded.push(' ');
    for c in description.to_lowercase().chars() {
        folded.push(if c.is_alphanumeric() { c } else { ' ' });
    }
    folded.push(' ');
    folded
}

/// Keyword-table category for a description.
pub fn categorize(description: &str) -> &'static str {
    let folded = fold(description);
    RULES
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|k| folded.contains(&format!(" {}", k)))
        })
        .map(|(category, _)| *category)
        .unwrap_or(OTHER)
}

/// Ask the AI backend for a category, falling back to the keyword table on
/// failure or on an answer outside [`CATEGORIES`].
pub fn categorize_with_ai(
    backend: &dyn AiBackend,
    config: &AiConfig,
    credential: &str,
    description: &str,
) -> String {
    let request = CompletionRequest {
        model: config.model.clone(),
        system: None,
        prompt: category_prompt(description, CATEGORIES),
        max_tokens: 10,
        temperature: 0.0,
    };

    match backend.complete(credential, &request) {
        Ok(answer) => {
            let answer = answer
                .trim()
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if let Some(category) = CATEGORIES.iter().find(|c| **c == answer) {
                trace!("AI category for '{}': {}", description, category);
                return category.to_string();
            }
            debug!("AI returned unknown category '{}', using keywords", answer);
        }
        Err(e) => debug!("AI categorization failed: {}", e),
    }

    categorize(description).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AiError;

    #[test]
    fn test_keyword_categories() {
        assert_eq!(categorize("OXXO"), "conveniencia");
        assert_eq!(categorize("RESTAURANTE PIZZA HUT"), "restaurante");
        assert_eq!(categorize("UBER TRIP"), "transporte");
        assert_eq!(categorize("UBER EATS PEDIDO"), "restaurante");
        assert_eq!(categorize("SU PAGO SPEI"), "ingreso");
        assert_eq!(categorize("RETIRO CAJERO"), "retiro");
        assert_eq!(categorize("SIH 9511279T7 HEB GONZALITOS MON"), "supermercado");
        assert_eq!(categorize("NETFLIX.COM"), "entretenimiento");
        assert_eq!(categorize("UNKNOWN MERCHANT"), "otros");
    }

    #[test]
    fn test_keywords_match_word_starts_only() {
        assert_eq!(categorize("THEBEST SHOP"), "otros");
        assert_eq!(categorize("GASOLINERA PEMEX"), "transporte");
    }

    struct FixedAnswer(Result<&'static str, ()>);

    impl AiBackend for FixedAnswer {
        fn complete(&self, _credential: &str, _request: &CompletionRequest) -> Result<String, AiError> {
            self.0
                .map(str::to_string)
                .map_err(|_| AiError::Request("offline".to_string()))
        }
    }

    #[test]
    fn test_ai_category_accepted() {
        let backend = FixedAnswer(Ok(" Servicios.\n"));
        let category = categorize_with_ai(&backend, &AiConfig::default(), "sk", "CARGO RECURRENTE");
        assert_eq!(category, "servicios");
    }

    #[test]
    fn test_ai_category_falls_back() {
        let config = AiConfig::default();
        let unknown = FixedAnswer(Ok("groceries"));
        assert_eq!(categorize_with_ai(&unknown, &config, "sk", "OXXO"), "conveniencia");

        let failing = FixedAnswer(Err(()));
        assert_eq!(categorize_with_ai(&failing, &config, "sk", "UBER TRIP"), "transporte");
    }
}
