//! Gemini streaming backend
//!
//! Talks to the Generative Language API in SSE streaming mode
//! (`streamGenerateContent?alt=sse`) and adapts the event stream to the
//! `GenerativeBackend` contract. The request carries an explicit timeout;
//! it bounds the whole call including the streamed body read.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{future, stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::backend::{
    BackendError, GenerationRequest, GenerationStream, GenerativeBackend, TextChunk, TokenUsage,
};

pub const DEFAULT_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct GeminiBackend {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, BackendError> {
        if config.api_key.trim().is_empty() {
            return Err(BackendError::MissingCredential);
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::RequestFailed {
                message: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url, self.config.model
        )
    }

    fn request_body(request: &GenerationRequest) -> serde_json::Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": request.prompt}],
            }],
            "generationConfig": {
                "temperature": request.temperature,
                "thinkingConfig": {"thinkingBudget": request.thinking_budget},
            },
        });
        if request.web_search {
            body["tools"] = json!([{"google_search": {}}]);
        }
        body
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationStream, BackendError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&Self::request_body(&request))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(BackendError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        // SSE events arrive as `data: <json>` lines; byte chunks do not
        // align with line boundaries, so buffer and drain complete lines.
        let chunks = response
            .bytes_stream()
            .map_err(request_error)
            .scan(String::new(), |buffer, result| {
                let emitted = match result {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        drain_complete_lines(buffer)
                    }
                    Err(error) => vec![Err(error)],
                };
                future::ready(Some(stream::iter(emitted)))
            })
            .flatten();

        Ok(Box::pin(chunks))
    }
}

fn request_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::RequestFailed {
            message: error.to_string(),
        }
    }
}

/// Split complete lines off the buffer and parse their SSE payloads.
fn drain_complete_lines(buffer: &mut String) -> Vec<Result<TextChunk, BackendError>> {
    let mut emitted = Vec::new();
    while let Some(newline) = buffer.find('\n') {
        let line = buffer[..newline].trim_end_matches('\r').to_string();
        buffer.drain(..=newline);
        if let Some(payload) = line.strip_prefix("data: ") {
            if let Some(chunk) = parse_sse_payload(payload) {
                emitted.push(Ok(chunk));
            }
        }
    }
    emitted
}

#[derive(Deserialize)]
struct SseEvent {
    #[serde(default)]
    candidates: Vec<SseCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct SseCandidate {
    content: Option<SseContent>,
}

#[derive(Deserialize)]
struct SseContent {
    #[serde(default)]
    parts: Vec<SsePart>,
}

#[derive(Deserialize)]
struct SsePart {
    text: Option<String>,
}

/// Parse one SSE data payload into a chunk.
///
/// Payloads that carry neither text nor usage (tool-call bookkeeping,
/// `[DONE]` markers, malformed events) are dropped.
fn parse_sse_payload(payload: &str) -> Option<TextChunk> {
    let event: SseEvent = serde_json::from_str(payload).ok()?;

    let mut text = String::new();
    for candidate in &event.candidates {
        if let Some(content) = &candidate.content {
            for part in &content.parts {
                if let Some(t) = &part.text {
                    text.push_str(t);
                }
            }
        }
    }

    if text.is_empty() && event.usage_metadata.is_none() {
        return None;
    }
    Some(TextChunk {
        text,
        usage: event.usage_metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_blank_api_key() {
        let result = GeminiBackend::new(GeminiConfig::new("  "));
        assert!(matches!(result, Err(BackendError::MissingCredential)));
    }

    #[test]
    fn request_body_includes_search_tool_when_enabled() {
        let request = GenerationRequest::deterministic("finde dieses Buch");
        let body = GeminiBackend::request_body(&request);
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
        assert!(body["tools"].is_array());

        let mut quiet = request;
        quiet.web_search = false;
        let body = GeminiBackend::request_body(&quiet);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn parses_text_payload() {
        let chunk = parse_sse_payload(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"Titel\":"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.text, "{\"Titel\":");
        assert!(chunk.usage.is_none());
    }

    #[test]
    fn parses_usage_only_payload() {
        let chunk = parse_sse_payload(
            r#"{"candidates":[],"usageMetadata":{"promptTokenCount":812,"totalTokenCount":908}}"#,
        )
        .unwrap();
        assert!(chunk.text.is_empty());
        assert_eq!(chunk.usage.unwrap().prompt_tokens, Some(812));
    }

    #[test]
    fn drops_payloads_without_content() {
        assert!(parse_sse_payload("[DONE]").is_none());
        assert!(parse_sse_payload(r#"{"candidates":[]}"#).is_none());
    }

    #[test]
    fn drains_only_complete_lines() {
        let mut buffer = String::from(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hallo\"}]}}]}\r\ndata: {\"cand",
        );
        let emitted = drain_complete_lines(&mut buffer);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].as_ref().unwrap().text, "Hallo");
        assert_eq!(buffer, "data: {\"cand");
    }
}
