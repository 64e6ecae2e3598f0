//! OpenAI chat-completions backend.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{AiBackend, CompletionRequest};
use crate::error::AiError;

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageOut,
}

#[derive(Deserialize)]
struct MessageOut {
    content: Option<String>,
}

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiBackend {
    client: Client,
    endpoint: String,
}

impl OpenAiBackend {
    /// Create a backend posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    fn body<'a>(request: &'a CompletionRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        messages.push(Message {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &request.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

impl AiBackend for OpenAiBackend {
    fn complete(&self, credential: &str, request: &CompletionRequest) -> Result<String, AiError> {
        if credential.trim().is_empty() {
            return Err(AiError::MissingCredential);
        }

        debug!(
            "POST {} model={} prompt_chars={}",
            self.endpoint,
            request.model,
            request.prompt.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.trim())
            .json(&Self::body(request))
            .send()
            .map_err(|e| AiError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| AiError::Response(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::Response("no choices in response".to_string()))?;

        trace!("completion returned {} chars", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            system: Some("system text".to_string()),
            prompt: "user text".to_string(),
            max_tokens: 4000,
            temperature: 0.1,
        }
    }

    #[test]
    fn test_missing_credential() {
        let backend = OpenAiBackend::new("http://127.0.0.1:9/v1/chat/completions");
        assert!(matches!(
            backend.complete("  ", &request()),
            Err(AiError::MissingCredential)
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let req = request();
        let body = serde_json::to_value(OpenAiBackend::body(&req)).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user text");
        assert_eq!(body["max_tokens"], 4000);
    }

    #[test]
    fn test_response_envelope() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"[]"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("[]"));
    }
}
