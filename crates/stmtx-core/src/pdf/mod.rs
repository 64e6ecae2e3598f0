//! PDF processing module.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for paginated document readers.
///
/// Pages are numbered from 1.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// Extract the text layer of a specific page.
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Render a page as an image at (at least) the specified DPI.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;
}
