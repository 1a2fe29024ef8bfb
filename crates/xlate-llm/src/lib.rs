//! Streaming client for an OpenAI-compatible chat-completion service.
//!
//! [`LlmClient::stream_chat`] opens a completion with `stream: true` and
//! turns the SSE response into a `Stream` of content deltas. The stream is
//! handed back as soon as the service has accepted the request, so the
//! caller observes first-token latency bounded only by the remote service.

use async_stream::stream;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors returned by the model client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// An HTTP request failed (network error, TLS failure, timeout).
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The model service answered with a non-success status.
    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// A message sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// `"system"`, `"user"`, or `"assistant"`.
    pub role: String,
    pub content: String,
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub stream: bool,
}

// Wire shape of one SSE chunk: {"choices":[{"delta":{"content":"..."}}]}.

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Outcome of parsing one SSE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A content delta to forward.
    Delta(String),
    /// The `[DONE]` terminator.
    Done,
    /// Comment, keep-alive, empty delta, or unparsable line.
    Skip,
}

/// Parse a single line of an OpenAI-style SSE body.
///
/// Lines that are empty, comments (`:` prefix), carry no content, or fail to
/// decode are skipped; the stream stays usable across service quirks.
pub fn parse_sse_line(line: &str) -> SseEvent {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return SseEvent::Skip;
    }
    let Some(data) = line.strip_prefix("data:") else {
        return SseEvent::Skip;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return SseEvent::Done;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
            Some(content) if !content.is_empty() => SseEvent::Delta(content),
            _ => SseEvent::Skip,
        },
        Err(_) => SseEvent::Skip,
    }
}

/// Stream of content deltas produced by [`LlmClient::stream_chat`].
pub type TokenStream = BoxStream<'static, Result<String, LlmError>>;

/// Client for the chat-completion REST API.
///
/// Process-wide: construct once at startup and share across requests.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key,
        }
    }

    /// Open a streaming completion and return the delta stream.
    ///
    /// The returned future resolves once the service has accepted the
    /// request and response headers are in; token deltas then arrive on the
    /// stream as the model produces them. Mid-stream transport failures
    /// surface as `Err` items on the stream.
    pub async fn stream_chat(
        &self,
        req: &ChatCompletionRequest,
    ) -> Result<TokenStream, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %req.model, messages = req.messages.len(), "opening completion stream");

        let mut http_req = self.http.post(&url).json(req);
        if let Some(key) = &self.api_key {
            http_req = http_req.bearer_auth(key);
        }
        let resp = http_req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let mut bytes = Box::pin(resp.bytes_stream());
        let deltas = stream! {
            let mut buf = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk: Bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        yield Err(LlmError::Http(e));
                        return;
                    }
                };
                buf.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(nl) = buf.find('\n') {
                    let line: String = buf.drain(..=nl).collect();
                    match parse_sse_line(&line) {
                        SseEvent::Delta(content) => yield Ok(content),
                        SseEvent::Done => return,
                        SseEvent::Skip => {}
                    }
                }
            }
        };
        Ok(deltas.boxed())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_delta_line() {
        let line = r#"data: {"choices":[{"delta":{"content":"const"}}]}"#;
        assert_eq!(parse_sse_line(line), SseEvent::Delta("const".into()));
    }

    #[test]
    fn parse_done_terminator() {
        assert_eq!(parse_sse_line("data: [DONE]"), SseEvent::Done);
        assert_eq!(parse_sse_line("data:[DONE]"), SseEvent::Done);
    }

    #[test]
    fn parse_skips_noise() {
        assert_eq!(parse_sse_line(""), SseEvent::Skip);
        assert_eq!(parse_sse_line(": keep-alive"), SseEvent::Skip);
        assert_eq!(parse_sse_line("event: ping"), SseEvent::Skip);
        assert_eq!(parse_sse_line("data: not json"), SseEvent::Skip);
    }

    #[test]
    fn parse_skips_empty_delta() {
        let role_only = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_sse_line(role_only), SseEvent::Skip);
        let empty = r#"data: {"choices":[{"delta":{"content":""}}]}"#;
        assert_eq!(parse_sse_line(empty), SseEvent::Skip);
    }

    #[test]
    fn parse_skips_finish_chunk() {
        let finish = r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_sse_line(finish), SseEvent::Skip);
    }

    #[test]
    fn request_serializes_stream_flag() {
        let req = ChatCompletionRequest {
            model: "ft:gpt-3.5-turbo:translate".into(),
            messages: vec![Message { role: "user".into(), content: "hi".into() }],
            temperature: 0.0,
            stream: true,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["stream"], serde_json::json!(true));
        assert_eq!(v["temperature"], serde_json::json!(0.0));
    }
}
