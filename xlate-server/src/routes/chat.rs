//! Chat endpoint: prompt selection + streamed generation.
//!
//! The response body is the live token stream from the model service; the
//! run identifier is attached as the `x-langsmith-run-id` header, which is
//! why the response is gated on the run-bridge (headers cannot be added
//! once the stream has started).

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use tracing::debug;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::prompt::select_prompt;
use crate::schemas::chat::ChatRequest;
use crate::state::AppState;
use crate::{bridge, chain};

/// Response header carrying the generation run identifier (empty when the
/// run was not recorded).
pub static X_RUN_ID: &str = "x-langsmith-run-id";

/// Maximum combined message length in bytes to prevent memory exhaustion.
const MAX_PROMPT_BYTES: usize = 128 * 1024; // 128 KiB

#[derive(OpenApi)]
#[openapi(paths(chat), components(schemas(ChatRequest)))]
pub struct ChatApi;

/// Register chat routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

/// Streamed code translation (`POST /api/chat`).
///
/// Success is a chunked `text/plain` body of raw token bytes with the run
/// identifier in [`X_RUN_ID`]. The response is not constructed until the
/// generation run has started, so the header value is always final.
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Streaming token response; run id in x-langsmith-run-id"),
        (status = 400, description = "Empty conversation or oversized prompt"),
        (status = 500, description = "Upstream failure before generation started"),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, ServerError> {
    let total_bytes: usize = req.messages.iter().map(|m| m.content.len()).sum();
    if total_bytes > MAX_PROMPT_BYTES {
        return Err(ServerError::BadRequest(format!(
            "conversation too large ({total_bytes} bytes); maximum is {MAX_PROMPT_BYTES} bytes"
        )));
    }

    let selection = select_prompt(&state.config, &req.messages)?;
    debug!(
        template = %selection.template,
        messages = req.messages.len(),
        "starting chat turn"
    );

    let wait = Duration::from_secs(state.config.run_start_timeout_secs);
    let pipeline_state = state.clone();
    let started = bridge::start_streaming(wait, move |start, sink| {
        chain::run(pipeline_state, selection, start, sink)
    })
    .await?;

    let run_id = started.run_id.map(|id| id.to_string()).unwrap_or_default();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(X_RUN_ID, run_id)
        .body(Body::from_stream(started.body))
        .map_err(|e| ServerError::Internal(e.to_string()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::config::Config;

    /// State pointing at unroutable endpoints; good for exercising handler
    /// validation, which must reject before any remote call is made.
    pub fn test_state() -> Arc<AppState> {
        Arc::new(AppState::from_config(Config {
            bind_address: String::new(),
            log_level: String::new(),
            log_json: false,
            cors_allowed_origins: None,
            enable_swagger: false,
            model_base_url: "http://localhost:9".into(),
            model_api_key: None,
            model_name: "test".into(),
            hub_base_url: "http://localhost:9".into(),
            hub_api_key: None,
            trace_base_url: None,
            trace_api_key: None,
            initial_prompt: "o/initial".into(),
            followup_prompt: "o/follow-up".into(),
            run_start_timeout_secs: 30,
        }))
    }
}

#[cfg(test)]
mod test {
    use super::test_support::test_state;
    use super::*;
    use xlate_types::{ChatMessage, Role};

    #[tokio::test]
    async fn empty_conversation_is_rejected_before_any_remote_call() {
        let err = chat(State(test_state()), Json(ChatRequest { messages: vec![] }))
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn oversized_conversation_is_rejected() {
        let req = ChatRequest {
            messages: vec![ChatMessage::new(Role::Human, "x".repeat(MAX_PROMPT_BYTES + 1))],
        };
        let err = chat(State(test_state()), Json(req)).await.map(|_| ()).unwrap_err();
        match err {
            ServerError::BadRequest(msg) => assert!(msg.contains("too large")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
