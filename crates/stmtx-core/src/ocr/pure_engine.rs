//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{LayoutMode, OcrBackend, OcrRequest, TextBox, boxes_to_lines};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
///
/// Expects `det.onnx`, `latin_rec.onnx` and `latin_dict.txt` in the model
/// directory.
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    config: OcrConfig,
}

impl PureOcrEngine {
    /// Create an engine from model files in a directory.
    pub fn from_dir(model_dir: &Path, config: OcrConfig) -> Result<Self, OcrError> {
        let det_path = model_dir.join("det.onnx");
        let rec_path = model_dir.join("latin_rec.onnx");
        let dict_path = model_dir.join("latin_dict.txt");

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!("missing model file {}", path.display())));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self { engine, config })
    }

    /// Run detection and recognition, returning raw text boxes.
    fn detect_boxes(&self, image: &DynamicImage) -> Result<Vec<TextBox>, OcrError> {
        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        Ok(results
            .iter()
            .map(|r| TextBox {
                rect: polygon_to_rect(&r.bounding_box),
                text: if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
            })
            .collect())
    }
}

impl OcrBackend for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage, request: &OcrRequest) -> Result<String, OcrError> {
        if !request.is_latin_script() {
            return Err(OcrError::Recognition(format!(
                "no recognizer for language '{}', only Latin-script models are loaded",
                request.language
            )));
        }

        let start = Instant::now();
        let (width, height) = image.dimensions();
        debug!(
            "Recognizing {}x{} page (lang={}, layout={:?})",
            width, height, request.language, request.layout
        );

        let boxes = self.detect_boxes(image)?;
        let box_count = boxes.len();

        let text = match request.layout {
            LayoutMode::SparseText => {
                let mut boxes = boxes;
                boxes.sort_by(|a, b| {
                    (a.rect.1, a.rect.0)
                        .partial_cmp(&(b.rect.1, b.rect.0))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                boxes
                    .into_iter()
                    .map(|b| b.text.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            LayoutMode::Auto | LayoutMode::SingleBlock => boxes_to_lines(boxes),
        };

        info!(
            "OCR complete: {} text boxes in {}ms",
            box_count,
            start.elapsed().as_millis()
        );

        Ok(text)
    }
}

/// Axis-aligned bounds of a detection polygon.
fn polygon_to_rect(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32, f32, f32) {
    let mut rect = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
    for coord in polygon.exterior().coords() {
        let (x, y) = (coord.x as f32, coord.y as f32);
        rect.0 = rect.0.min(x);
        rect.1 = rect.1.min(y);
        rect.2 = rect.2.max(x);
        rect.3 = rect.3.max(y);
    }
    if rect.0 > rect.2 {
        return (0.0, 0.0, 0.0, 0.0);
    }
    rect
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_models_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let result = PureOcrEngine::from_dir(dir.path(), OcrConfig::default());
        assert!(matches!(result, Err(OcrError::ModelLoad(_))));
    }
}
