//! Feedback endpoint: create and update scored annotations on a run.
//!
//! Two entry operations, no intermediate states. Create (POST) needs a run
//! id and a numeric score; update (PUT) needs the feedback id. On update, a
//! score of exactly 1 keeps the free-text comment; any other score
//! reinterprets the comment as a desired correction. That branch is
//! one-way: positive feedback never produces a correction and negative
//! feedback never forwards a raw comment.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tracing::debug;
use utoipa::OpenApi;

use xlate_trace::{FeedbackUpdate, TraceClient};
use xlate_types::{Correction, FeedbackType};

use crate::error::ServerError;
use crate::schemas::feedback::{CreateFeedbackRequest, FeedbackResponse, UpdateFeedbackRequest};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(create_feedback, update_feedback),
    components(schemas(CreateFeedbackRequest, UpdateFeedbackRequest, FeedbackResponse))
)]
pub struct FeedbackApi;

/// Register feedback routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/feedback", post(create_feedback).put(update_feedback))
}

/// Create feedback for a run (`POST /api/feedback`).
#[utoipa::path(
    post,
    path = "/api/feedback",
    tag = "feedback",
    request_body = CreateFeedbackRequest,
    responses(
        (status = 200, description = "Feedback created", body = FeedbackResponse),
        (status = 400, description = "Missing run id or non-numeric score"),
        (status = 500, description = "Tracing service failure"),
    )
)]
pub async fn create_feedback(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ServerError> {
    let run_id = req
        .run_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServerError::BadRequest("a run id and a numeric score are required".into()))?;
    let score = parse_score(req.score.as_ref())
        .ok_or_else(|| ServerError::BadRequest("a run id and a numeric score are required".into()))?;
    let key = FeedbackType::from_wire(req.feedback_type.as_deref());

    debug!(run_id, ?key, score, "creating feedback");
    let feedback = trace_client(&state)?.create_feedback(run_id, key, score).await?;
    Ok(Json(FeedbackResponse { feedback }))
}

/// Update existing feedback (`PUT /api/feedback`).
#[utoipa::path(
    put,
    path = "/api/feedback",
    tag = "feedback",
    request_body = UpdateFeedbackRequest,
    responses(
        (status = 200, description = "Feedback updated", body = FeedbackResponse),
        (status = 400, description = "Missing feedback id"),
        (status = 500, description = "Tracing service failure"),
    )
)]
pub async fn update_feedback(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateFeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ServerError> {
    let id = req
        .id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServerError::BadRequest("a feedback id is required".into()))?;

    let (comment, correction) = split_comment(req.score.as_ref(), req.comment.clone());
    let update = FeedbackUpdate { score: req.score.clone(), comment, correction };

    debug!(feedback_id = id, "updating feedback");
    let feedback = trace_client(&state)?.update_feedback(id, &update).await?;
    Ok(Json(FeedbackResponse { feedback }))
}

fn trace_client(state: &AppState) -> Result<&TraceClient, ServerError> {
    state
        .trace
        .as_deref()
        .ok_or_else(|| ServerError::Internal("tracing service is not configured".into()))
}

/// Coerce the wire score to a number. JSON numbers pass through; numeric
/// strings are accepted; everything else (including absence) is rejected.
fn parse_score(raw: Option<&Value>) -> Option<f64> {
    match raw? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Route the comment by score: exactly 1 keeps it as free text, anything
/// else (including a non-numeric score) turns it into a desired correction.
fn split_comment(score: Option<&Value>, comment: Option<String>) -> (Option<String>, Option<Correction>) {
    if score.and_then(Value::as_f64) == Some(1.0) {
        (comment, None)
    } else {
        (None, Some(Correction { desired: comment }))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_score_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_score(Some(&json!(5))), Some(5.0));
        assert_eq!(parse_score(Some(&json!(0.5))), Some(0.5));
        assert_eq!(parse_score(Some(&json!("5"))), Some(5.0));
        assert_eq!(parse_score(Some(&json!(" 1.5 "))), Some(1.5));
    }

    #[test]
    fn parse_score_rejects_everything_else() {
        assert_eq!(parse_score(None), None);
        assert_eq!(parse_score(Some(&json!("five"))), None);
        assert_eq!(parse_score(Some(&json!(true))), None);
        assert_eq!(parse_score(Some(&json!(null))), None);
        assert_eq!(parse_score(Some(&json!({"v": 1}))), None);
    }

    #[test]
    fn positive_score_keeps_comment() {
        let (comment, correction) = split_comment(Some(&json!(1)), Some("nice".into()));
        assert_eq!(comment.as_deref(), Some("nice"));
        assert!(correction.is_none());
    }

    #[test]
    fn non_positive_score_becomes_correction() {
        let (comment, correction) = split_comment(Some(&json!(0)), Some("should use X".into()));
        assert!(comment.is_none());
        assert_eq!(correction.unwrap().desired.as_deref(), Some("should use X"));
    }

    #[test]
    fn string_score_one_is_not_positive() {
        // Strict comparison: the string "1" is not the number 1.
        let (comment, correction) = split_comment(Some(&json!("1")), Some("hm".into()));
        assert!(comment.is_none());
        assert!(correction.is_some());
    }

    #[test]
    fn float_one_is_positive() {
        let (comment, correction) = split_comment(Some(&json!(1.0)), Some("good".into()));
        assert_eq!(comment.as_deref(), Some("good"));
        assert!(correction.is_none());
    }

    #[test]
    fn absent_comment_still_yields_correction_object() {
        let (comment, correction) = split_comment(Some(&json!(0)), None);
        assert!(comment.is_none());
        assert_eq!(correction, Some(Correction { desired: None }));
    }

    #[tokio::test]
    async fn create_without_run_id_is_rejected() {
        let state = crate::routes::chat::test_support::test_state();
        let req = CreateFeedbackRequest { run_id: None, score: Some(json!(5)), feedback_type: None };
        let err = create_feedback(State(state), Json(req)).await.map(|_| ()).unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn create_without_numeric_score_is_rejected() {
        let state = crate::routes::chat::test_support::test_state();
        let req = CreateFeedbackRequest {
            run_id: Some("r1".into()),
            score: Some(json!("not a number")),
            feedback_type: None,
        };
        let err = create_feedback(State(state), Json(req)).await.map(|_| ()).unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn update_without_id_is_rejected() {
        let state = crate::routes::chat::test_support::test_state();
        let req = UpdateFeedbackRequest { id: None, score: Some(json!(1)), comment: None };
        let err = update_feedback(State(state), Json(req)).await.map(|_| ()).unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }
}
