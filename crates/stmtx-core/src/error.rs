//! Error types for the stmtx-core library.

use thiserror::Error;

/// Main error type for the stmtx library.
#[derive(Error, Debug)]
pub enum StatementError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// AI backend error.
    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    /// Transaction extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Date or amount normalization error.
    #[error("normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to produce a raster image for a page.
    #[error("failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Errors raised by the AI completion backend.
#[derive(Error, Debug)]
pub enum AiError {
    /// No credential was supplied.
    #[error("missing API credential")]
    MissingCredential,

    /// Transport-level failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered but the envelope could not be read.
    #[error("malformed service response: {0}")]
    Response(String),
}

/// Errors related to transaction extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A response could not be decoded into transactions.
    #[error("unparseable response: {0}")]
    Unparseable(String),

    /// No text was available to extract from.
    #[error("no text to extract from")]
    NoText,
}

/// Errors raised while normalizing a single candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// None of the known date formats matched.
    #[error("unrecognized date: {value}")]
    Date { value: String },

    /// The amount string is not a number.
    #[error("unrecognized amount: {value}")]
    Amount { value: String },

    /// The amount normalized to zero.
    #[error("zero amount")]
    ZeroAmount,

    /// The description is too short to be a transaction.
    #[error("description too short: {value:?}")]
    Description { value: String },
}

/// Result type for the stmtx library.
pub type Result<T> = std::result::Result<T, StatementError>;
