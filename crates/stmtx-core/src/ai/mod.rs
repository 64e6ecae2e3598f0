//! AI-assisted transaction extraction.

mod chunking;
mod legacy;
mod openai;
mod parser;
pub(crate) mod prompts;
mod validate;

pub use chunking::chunk_text;
pub use legacy::LegacyAiExtractor;
pub use openai::OpenAiBackend;
pub use parser::{AiTransactionParser, parse_response, recover_from_text};
pub use validate::CandidateValidator;

use crate::error::AiError;

/// One text-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// System instruction, if any.
    pub system: Option<String>,
    /// User prompt.
    pub prompt: String,
    /// Response token limit.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// A request/response text-completion service.
pub trait AiBackend {
    /// Complete a prompt. `credential` is the caller's API key.
    fn complete(&self, credential: &str, request: &CompletionRequest) -> Result<String, AiError>;
}
