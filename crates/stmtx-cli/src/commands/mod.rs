//! Subcommands and the extraction setup they share.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{debug, warn};

use stmtx_core::{PureOcrEngine, StatementConfig, StatementExtractor};

/// Extraction options common to `process` and `batch`.
#[derive(Args, Clone, Debug)]
pub struct ExtractOptions {
    /// API key for the AI strategies (AI steps are skipped without one)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OCR model directory (det.onnx, latin_rec.onnx, latin_dict.txt)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// OCR language hint (e.g. "spa", "eng")
    #[arg(long)]
    lang: Option<String>,

    /// Use only the PDF text layer, never OCR
    #[arg(long)]
    no_ocr: bool,
}

impl ExtractOptions {
    fn credential(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stmtx")
        .join("config.json")
}

/// Load the configuration from `path`, else the default location, else defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<StatementConfig> {
    if let Some(path) = path {
        return Ok(StatementConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(StatementConfig::from_file(&default_path)?)
    } else {
        Ok(StatementConfig::default())
    }
}

fn build_extractor(mut config: StatementConfig, options: &ExtractOptions) -> StatementExtractor {
    if let Some(lang) = &options.lang {
        config.ocr.language = lang.clone();
    }

    let model_dir = options
        .model_dir
        .clone()
        .unwrap_or_else(|| config.ocr.model_dir.clone());
    let ocr = if options.no_ocr {
        None
    } else {
        match PureOcrEngine::from_dir(&model_dir, config.ocr.clone()) {
            Ok(engine) => Some(engine),
            Err(e) => {
                warn!("OCR unavailable, image-only pages will yield no text: {}", e);
                None
            }
        }
    };

    let extractor = StatementExtractor::new(config);
    match ocr {
        Some(engine) => extractor.with_ocr_backend(engine),
        None => extractor,
    }
}

/// Run `work` with a ready extractor on the blocking thread pool.
pub async fn with_extractor<T, F>(
    config: StatementConfig,
    options: ExtractOptions,
    work: F,
) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&StatementExtractor, &str) -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let extractor = build_extractor(config, &options);
        work(&extractor, options.credential())
    })
    .await?
}
