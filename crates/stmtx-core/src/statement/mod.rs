//! Statement transaction parsers: generic templates, bank profiles and HSBC.

mod banks;
mod generic;
mod hsbc;
pub mod rules;

pub use banks::{BankProfile, parser_for};
pub use generic::TemplateParser;
pub use hsbc::HsbcParser;

use crate::error::ExtractionError;
use crate::models::TransactionCandidate;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// A strategy turning document text into transaction candidates.
pub trait TransactionParser {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Parse candidates from document text, line by line.
    fn parse(&self, text: &str) -> Result<Vec<TransactionCandidate>>;
}
