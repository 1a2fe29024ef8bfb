//! Feedback endpoint request / response types.
//!
//! `score` is deliberately loose (`serde_json::Value`): the browser sends
//! numbers, but numeric strings are accepted too and coerced at validation
//! time.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use xlate_types::FeedbackRecord;

/// Request body for `POST /api/feedback`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateFeedbackRequest {
    /// Run the feedback refers to. Required.
    pub run_id: Option<String>,
    /// Score; must coerce to a number. Required.
    pub score: Option<serde_json::Value>,
    /// Only the literal `"did_copy"` selects the copy-event type.
    pub feedback_type: Option<String>,
}

/// Request body for `PUT /api/feedback`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateFeedbackRequest {
    /// Feedback record to mutate. Required.
    pub id: Option<String>,
    /// Forwarded as-is to the tracing service.
    pub score: Option<serde_json::Value>,
    /// Free text for a positive score; reinterpreted as a desired
    /// correction for any other score.
    pub comment: Option<String>,
}

/// Response body for both feedback operations.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedbackResponse {
    pub feedback: FeedbackRecord,
}
