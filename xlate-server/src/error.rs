//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! Upstream failures (prompt hub, model service, tracing service) are
//! reported with their message text so the browser can show what went
//! wrong; they are additionally logged with full detail server side. They
//! are never retried at this layer.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// All errors that can occur in the xlate-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Propagated from the prompt hub client.
    #[error(transparent)]
    Hub(#[from] xlate_hub::HubError),

    /// Propagated from the chat-completion client.
    #[error(transparent)]
    Llm(#[from] xlate_llm::LlmError),

    /// Propagated from the tracing/feedback client.
    #[error(transparent)]
    Trace(#[from] xlate_trace::TraceError),

    /// The generation run did not start within the bounded wait.
    #[error("generation did not start within {0} seconds")]
    RunStartTimeout(u64),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Hub(_)
            | ServerError::Llm(_)
            | ServerError::Trace(_)
            | ServerError::RunStartTimeout(_)
            | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        // Log the full chain before flattening it to a message so diagnostic
        // detail is preserved in the server logs.
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
