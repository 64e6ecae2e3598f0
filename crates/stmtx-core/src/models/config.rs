//! Configuration structures for the extraction pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ocr::LayoutMode;

/// Main configuration for the stmtx pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// AI backend configuration.
    pub ai: AiConfig,

    /// Transaction extraction configuration.
    pub extraction: ExtractionConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            max_pages: 0,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Language hint passed to the recognizer (ISO 639-2, e.g. "spa").
    /// The native engine only accepts Latin-script languages.
    pub language: String,

    /// Page segmentation mode.
    pub layout_mode: LayoutMode,

    /// Directory containing the recognition models.
    pub model_dir: PathBuf,

    /// Keep `[UNK]` tokens in recognized text.
    pub keep_unk: bool,

    /// Run the denoise/binarize pipeline before recognition.
    pub enable_preprocessing: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "spa".to_string(),
            layout_mode: LayoutMode::SingleBlock,
            model_dir: PathBuf::from("models"),
            keep_unk: false,
            enable_preprocessing: true,
        }
    }
}

/// AI backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Chat completions endpoint.
    pub endpoint: String,

    /// Model for the primary chunked extraction.
    pub model: String,

    /// Model for the legacy final fallback.
    pub legacy_model: String,

    /// Token budget per chunk.
    pub max_chunk_tokens: usize,

    /// Characters assumed per token when sizing chunks.
    pub chars_per_token: usize,

    /// Response token limit for the primary extraction.
    pub max_response_tokens: u32,

    /// Response token limit for the legacy extraction.
    pub legacy_max_response_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Width of a legacy extraction window in characters.
    pub legacy_window_chars: usize,

    /// Advance between legacy windows in characters.
    pub legacy_window_step: usize,

    /// Ask the backend for categories before the keyword table.
    pub categorize_with_ai: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            legacy_model: "gpt-3.5-turbo".to_string(),
            max_chunk_tokens: 12_000,
            chars_per_token: 4,
            max_response_tokens: 4000,
            legacy_max_response_tokens: 3000,
            temperature: 0.1,
            legacy_window_chars: 25_000,
            legacy_window_step: 20_000,
            categorize_with_ai: false,
        }
    }
}

impl AiConfig {
    /// Character budget of a single chunk.
    pub fn max_chunk_chars(&self) -> usize {
        self.max_chunk_tokens
            .saturating_mul(self.chars_per_token)
            .max(1)
    }
}

/// Transaction extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Smallest accepted magnitude for AI-produced amounts.
    pub min_amount: Decimal,

    /// Descriptions must be longer than this many characters.
    pub min_description_len: usize,

    /// Description prefix length used by the deduplication key.
    pub dedup_description_prefix: usize,

    /// Re-run pages through OCR when the text layer is unusable.
    pub fallback_to_ocr: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_amount: Decimal::ONE,
            min_description_len: 2,
            dedup_description_prefix: 50,
            fallback_to_ocr: true,
        }
    }
}

impl StatementConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: StatementConfig =
            serde_json::from_str(r#"{"ai": {"model": "gpt-4o"}}"#).unwrap();
        assert_eq!(config.ai.model, "gpt-4o");
        assert_eq!(config.ai.max_chunk_tokens, 12_000);
        assert_eq!(config.pdf.render_dpi, 300);
        assert_eq!(config.ocr.language, "spa");
        assert_eq!(config.extraction.min_amount, Decimal::ONE);
    }

    #[test]
    fn test_chunk_budget() {
        let ai = AiConfig::default();
        assert_eq!(ai.max_chunk_chars(), 48_000);
    }

    #[test]
    fn test_chunk_budget_saturates() {
        let ai = AiConfig {
            max_chunk_tokens: usize::MAX,
            chars_per_token: 4,
            ..AiConfig::default()
        };
        assert_eq!(ai.max_chunk_chars(), usize::MAX);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = StatementConfig::default();
        config.ocr.language = "eng".to_string();
        config.save(&path).unwrap();

        let loaded = StatementConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.language, "eng");
    }
}
