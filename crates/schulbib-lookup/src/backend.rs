//! Generative backend contract
//!
//! The lookup pipeline treats the text/search backend as a black box that
//! takes a prompt and yields a finite stream of text chunks, optionally
//! closing with token-usage metadata. Streams are not restartable; a retry
//! is a fresh `generate` call.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One generation request.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    /// Enable the backend's web-search tool.
    pub web_search: bool,
    /// Thinking-effort hint; 0 disables extended reasoning.
    pub thinking_budget: u32,
}

impl GenerationRequest {
    /// A deterministic request as the lookup pipeline issues it.
    pub fn deterministic(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.0,
            web_search: true,
            thinking_budget: 0,
        }
    }
}

/// Token-usage summary, reported by the backend at stream end if at all.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(rename = "promptTokenCount", default)]
    pub prompt_tokens: Option<u32>,
    #[serde(rename = "candidatesTokenCount", default)]
    pub output_tokens: Option<u32>,
    #[serde(rename = "totalTokenCount", default)]
    pub total_tokens: Option<u32>,
}

/// One element of the response stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextChunk {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl TextChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// Finite stream of response chunks.
pub type GenerationStream = Pin<Box<dyn Stream<Item = Result<TextChunk, BackendError>> + Send>>;

/// Errors from the generative backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("API key missing")]
    MissingCredential,
    #[error("Request failed: {message}")]
    RequestFailed { message: String },
    #[error("Backend returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Rate limited by backend")]
    RateLimited,
    #[error("Timeout")]
    Timeout,
    #[error("Stream error: {message}")]
    Stream { message: String },
}

impl BackendError {
    /// Whether this error is quota/rate-limit flavored and should surface
    /// as a throttling message rather than a generic failure.
    pub fn is_quota(&self) -> bool {
        match self {
            BackendError::RateLimited => true,
            BackendError::Api { status, body } => {
                let body = body.to_lowercase();
                *status == 429 || body.contains("quota") || body.contains("rate limit")
            }
            _ => false,
        }
    }
}

#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Start one generation and return its chunk stream.
    async fn generate(&self, request: GenerationRequest)
        -> Result<GenerationStream, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_request_has_temperature_zero() {
        let request = GenerationRequest::deterministic("finde dieses Buch");
        assert_eq!(request.temperature, 0.0);
        assert!(request.web_search);
        assert_eq!(request.thinking_budget, 0);
    }

    #[test]
    fn quota_detection_by_status_and_substring() {
        assert!(BackendError::RateLimited.is_quota());
        assert!(BackendError::Api {
            status: 429,
            body: String::new()
        }
        .is_quota());
        assert!(BackendError::Api {
            status: 500,
            body: "Quota exceeded for project".to_string()
        }
        .is_quota());
        assert!(!BackendError::Timeout.is_quota());
        assert!(!BackendError::Api {
            status: 500,
            body: "internal".to_string()
        }
        .is_quota());
    }

    #[test]
    fn usage_metadata_parses_backend_field_names() {
        let usage: TokenUsage = serde_json::from_str(
            r#"{"promptTokenCount": 812, "candidatesTokenCount": 96, "totalTokenCount": 908}"#,
        )
        .unwrap();
        assert_eq!(usage.prompt_tokens, Some(812));
        assert_eq!(usage.output_tokens, Some(96));
        assert_eq!(usage.total_tokens, Some(908));
    }
}
