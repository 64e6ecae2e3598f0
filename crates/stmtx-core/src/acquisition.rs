//! Text acquisition: text layer first, OCR when the text layer is unusable.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{OcrError, PdfError};
use crate::models::StatementConfig;
use crate::ocr::{ImagePreprocessor, OcrBackend, OcrRequest};
use crate::pdf::PdfProcessor;

/// Markers left behind when a glyph has no usable Unicode mapping.
const GLYPH_MARKERS: &[&str] = &["(cid:", "ææł", "ıæ", "øı", "łł", "ææıı", "\u{FFFD}"];

/// How a page's (or document's) text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMethod {
    /// The embedded text layer.
    TextLayer,
    /// Optical character recognition.
    Ocr,
}

/// Per-page acquisition diagnostics. Logging data only.
#[derive(Debug, Clone, Serialize)]
pub struct PageDiagnostics {
    /// Page number (1-based).
    pub page: u32,
    /// Method that produced the page text.
    pub method: TextMethod,
    /// Number of characters produced.
    pub chars: usize,
    /// Error that forced a fallback, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Document text with the method used and page diagnostics.
#[derive(Debug, Clone)]
pub struct AcquiredText {
    /// Page texts concatenated in page order.
    pub text: String,
    /// Method used for the document.
    pub method: TextMethod,
    /// Per-page diagnostics.
    pub pages: Vec<PageDiagnostics>,
}

/// Whether the text layer contains glyph-substitution artifacts.
pub fn has_glyph_markers(text: &str) -> bool {
    GLYPH_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Turns a loaded document into plain text.
pub struct TextAcquirer<'a> {
    pdf: &'a dyn PdfProcessor,
    ocr: Option<&'a dyn OcrBackend>,
    config: &'a StatementConfig,
    preprocessor: ImagePreprocessor,
}

impl<'a> TextAcquirer<'a> {
    /// Create an acquirer over a loaded document.
    pub fn new(
        pdf: &'a dyn PdfProcessor,
        ocr: Option<&'a dyn OcrBackend>,
        config: &'a StatementConfig,
    ) -> Self {
        Self {
            pdf,
            ocr,
            config,
            preprocessor: ImagePreprocessor::new(),
        }
    }

    fn page_numbers(&self) -> impl Iterator<Item = u32> {
        let count = self.pdf.page_count();
        let limit = match self.config.pdf.max_pages {
            0 => count,
            max => count.min(max as u32),
        };
        1..=limit
    }

    /// Acquire the document text. Never fails; per-page errors degrade to
    /// that page's raw (possibly empty) text.
    pub fn acquire(&self) -> AcquiredText {
        let mut raw_pages = Vec::new();
        let mut diagnostics = Vec::new();

        for page in self.page_numbers() {
            let (text, error) = match self.pdf.extract_page_text(page) {
                Ok(text) => (text, None),
                Err(e) => {
                    debug!("Page {} text layer failed: {}", page, e);
                    (String::new(), Some(e.to_string()))
                }
            };
            diagnostics.push(PageDiagnostics {
                page,
                method: TextMethod::TextLayer,
                chars: text.chars().count(),
                error,
            });
            raw_pages.push(text);
        }

        let layer_text = raw_pages.join("\n");
        let unusable = layer_text.trim().is_empty() || has_glyph_markers(&layer_text);

        if !unusable {
            info!(
                "Using text layer: {} pages, {} chars",
                raw_pages.len(),
                layer_text.len()
            );
            return AcquiredText {
                text: layer_text,
                method: TextMethod::TextLayer,
                pages: diagnostics,
            };
        }

        let ocr = match self.ocr {
            Some(ocr) if self.config.extraction.fallback_to_ocr => ocr,
            _ => {
                warn!("Text layer is unusable and no OCR engine is available");
                return AcquiredText {
                    text: layer_text,
                    method: TextMethod::TextLayer,
                    pages: diagnostics,
                };
            }
        };

        info!("Text layer is empty or garbled, running OCR on every page");
        let request = OcrRequest {
            language: self.config.ocr.language.clone(),
            layout: self.config.ocr.layout_mode,
        };

        let mut ocr_pages = Vec::with_capacity(raw_pages.len());
        let mut ocr_diagnostics = Vec::with_capacity(raw_pages.len());
        for (page, raw) in self.page_numbers().zip(raw_pages) {
            match self.ocr_page(ocr, page, &request) {
                Ok(text) => {
                    debug!("Page {}: OCR produced {} chars", page, text.len());
                    ocr_diagnostics.push(PageDiagnostics {
                        page,
                        method: TextMethod::Ocr,
                        chars: text.chars().count(),
                        error: None,
                    });
                    ocr_pages.push(text);
                }
                Err(e) => {
                    warn!("Page {}: OCR failed ({}), keeping raw page text", page, e);
                    ocr_diagnostics.push(PageDiagnostics {
                        page,
                        method: TextMethod::TextLayer,
                        chars: raw.chars().count(),
                        error: Some(e.to_string()),
                    });
                    ocr_pages.push(raw);
                }
            }
        }

        AcquiredText {
            text: ocr_pages.join("\n"),
            method: TextMethod::Ocr,
            pages: ocr_diagnostics,
        }
    }

    fn ocr_page(
        &self,
        ocr: &dyn OcrBackend,
        page: u32,
        request: &OcrRequest,
    ) -> Result<String, PageFailure> {
        let image = self.pdf.render_page(page, self.config.pdf.render_dpi)?;
        let image = if self.config.ocr.enable_preprocessing {
            self.preprocessor.preprocess(&image)
        } else {
            image
        };
        Ok(ocr.recognize(&image, request)?)
    }
}

/// Render or recognition failure for a single page.
#[derive(Debug, thiserror::Error)]
enum PageFailure {
    #[error("render failed: {0}")]
    Render(#[from] PdfError),
    #[error("recognition failed: {0}")]
    Recognize(#[from] OcrError),
}
