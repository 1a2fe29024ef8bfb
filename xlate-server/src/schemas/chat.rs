//! Chat endpoint request types.

use serde::Deserialize;
use utoipa::ToSchema;

use xlate_types::ChatMessage;

/// Request body for `POST /api/chat`.
///
/// The ordered message sequence is the conversation; the last element is
/// the current turn. The response is a chunked token stream, not JSON, with
/// the run identifier in the `x-langsmith-run-id` header.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}
