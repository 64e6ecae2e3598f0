//! OCR collaborator interface, page preprocessing, and the native engine.

mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;

pub use preprocessing::ImagePreprocessor;
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Page segmentation strategy requested from the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Fully automatic segmentation.
    Auto,
    /// One uniform block of text; keeps statement rows intact.
    #[default]
    SingleBlock,
    /// Scattered text with no particular order.
    SparseText,
}

/// Latin-script languages (ISO 639-2 codes) covered by the bundled
/// `latin_rec.onnx` recognizer.
pub const LATIN_SCRIPT_LANGUAGES: &[&str] = &[
    "spa", "eng", "por", "fra", "deu", "ita", "cat", "glg", "eus", "nld", "pol", "ron",
];

/// A recognition request for one page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    /// Language hint, one or more ISO 639-2 codes joined by `+`
    /// (e.g. "spa" or "spa+eng"). The native engine has a single Latin-script
    /// recognizer, so the hint does not select a model there; it only
    /// accepts languages in [`LATIN_SCRIPT_LANGUAGES`].
    pub language: String,
    /// Layout mode.
    pub layout: LayoutMode,
}

impl OcrRequest {
    /// Whether every requested language is written in Latin script.
    pub fn is_latin_script(&self) -> bool {
        self.language
            .split('+')
            .map(|code| code.trim().to_ascii_lowercase())
            .all(|code| LATIN_SCRIPT_LANGUAGES.contains(&code.as_str()))
    }
}

/// Optical character recognition engine.
pub trait OcrBackend {
    /// Recognize the text of a page image.
    fn recognize(&self, image: &DynamicImage, request: &OcrRequest) -> Result<String, OcrError>;
}

/// A recognized text box with its axis-aligned bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding rectangle (min_x, min_y, max_x, max_y).
    pub rect: (f32, f32, f32, f32),

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    fn center_y(&self) -> f32 {
        (self.rect.1 + self.rect.3) / 2.0
    }

    fn height(&self) -> f32 {
        (self.rect.3 - self.rect.1).max(1.0)
    }
}

/// Arrange boxes in reading order and join boxes sharing a visual row with
/// spaces, one row per output line.
pub fn boxes_to_lines(mut boxes: Vec<TextBox>) -> String {
    boxes.sort_by(|a, b| {
        a.center_y()
            .partial_cmp(&b.center_y())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut rows: Vec<Vec<TextBox>> = Vec::new();
    for text_box in boxes {
        match rows.last_mut() {
            Some(row)
                if row.first().is_some_and(|first| {
                    (text_box.center_y() - first.center_y()).abs()
                        < first.height().min(text_box.height()) / 2.0
                }) =>
            {
                row.push(text_box)
            }
            _ => rows.push(vec![text_box]),
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.rect.0.partial_cmp(&b.rect.0).unwrap_or(std::cmp::Ordering::Equal));
            row.iter()
                .map(|b| b.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("  ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
