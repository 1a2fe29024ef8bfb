//! Client for the remote run-tracing and feedback service.
//!
//! A *run* is one generation invocation; its identifier is minted client
//! side when the chain starts and registered here so feedback can be
//! attached to it later. Feedback records are created once per run and then
//! mutated through their own id; nothing is ever deleted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use xlate_types::{Correction, FeedbackRecord, FeedbackType};

/// Errors returned by tracing operations.
#[derive(Debug, Error)]
pub enum TraceError {
    /// An HTTP request failed (network error, TLS failure, timeout).
    #[error("trace request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The tracing service answered with a non-success status.
    #[error("trace service returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Payload for registering a new run.
#[derive(Debug, Clone, Serialize)]
pub struct RunCreate {
    pub id: Uuid,
    /// Human-readable run name; we use the prompt reference.
    pub name: String,
    /// Always `"chain"` for this service.
    pub run_type: String,
    pub inputs: serde_json::Value,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct RunEnd {
    outputs: serde_json::Value,
    end_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct FeedbackCreate<'a> {
    run_id: &'a str,
    key: FeedbackType,
    score: f64,
}

/// Payload for mutating an existing feedback record.
///
/// `comment` and `correction` are mutually exclusive by construction of the
/// feedback endpoint: a positive score keeps the free-text comment, any
/// other score reinterprets it as a desired correction.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correction: Option<Correction>,
}

/// Client for the tracing REST API.
///
/// Process-wide: constructed once at startup, shared behind `Arc`, never
/// torn down explicitly. All methods are `&self`; the client holds no
/// mutable state.
#[derive(Debug, Clone)]
pub struct TraceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl TraceClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, url);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        req
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, TraceError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(TraceError::Status { status: status.as_u16(), body })
    }

    /// Register a run (`POST /runs`).
    pub async fn create_run(&self, run: &RunCreate) -> Result<(), TraceError> {
        debug!(run_id = %run.id, name = %run.name, "registering run");
        let resp = self.request(reqwest::Method::POST, "/runs").json(run).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Record a run's final output (`PATCH /runs/{id}`).
    pub async fn end_run(&self, id: Uuid, outputs: serde_json::Value) -> Result<(), TraceError> {
        debug!(run_id = %id, "ending run");
        let body = RunEnd { outputs, end_time: Utc::now() };
        let resp = self
            .request(reqwest::Method::PATCH, &format!("/runs/{id}"))
            .json(&body)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Create a feedback record for a run (`POST /feedback`).
    pub async fn create_feedback(
        &self,
        run_id: &str,
        key: FeedbackType,
        score: f64,
    ) -> Result<FeedbackRecord, TraceError> {
        debug!(run_id, ?key, score, "creating feedback");
        let body = FeedbackCreate { run_id, key, score };
        let resp = self
            .request(reqwest::Method::POST, "/feedback")
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Mutate an existing feedback record (`PATCH /feedback/{id}`).
    pub async fn update_feedback(
        &self,
        id: &str,
        update: &FeedbackUpdate,
    ) -> Result<FeedbackRecord, TraceError> {
        debug!(feedback_id = id, "updating feedback");
        let resp = self
            .request(reqwest::Method::PATCH, &format!("/feedback/{id}"))
            .json(update)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_create_serializes_expected_fields() {
        let run = RunCreate {
            id: Uuid::nil(),
            name: "jacob/langchain-python-to-js".into(),
            run_type: "chain".into(),
            inputs: json!({ "code": "def foo(): pass" }),
            start_time: Utc::now(),
        };
        let v = serde_json::to_value(&run).unwrap();
        assert_eq!(v["run_type"], "chain");
        assert_eq!(v["inputs"]["code"], "def foo(): pass");
        assert!(v["start_time"].is_string());
    }

    #[test]
    fn feedback_create_uses_snake_case_key() {
        let body = FeedbackCreate { run_id: "r1", key: FeedbackType::DidCopy, score: 1.0 };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["key"], "did_copy");
        assert_eq!(v["run_id"], "r1");
    }

    #[test]
    fn feedback_update_skips_absent_fields() {
        let update = FeedbackUpdate {
            score: Some(json!(1)),
            comment: Some("nice".into()),
            correction: None,
        };
        let v = serde_json::to_value(&update).unwrap();
        assert_eq!(v, json!({ "score": 1, "comment": "nice" }));
    }

    #[test]
    fn feedback_update_correction_shape() {
        let update = FeedbackUpdate {
            score: Some(json!(0)),
            comment: None,
            correction: Some(Correction { desired: Some("should use X".into()) }),
        };
        let v = serde_json::to_value(&update).unwrap();
        assert_eq!(v, json!({ "score": 0, "correction": { "desired": "should use X" } }));
    }
}
