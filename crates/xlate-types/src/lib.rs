//! Shared wire types for the xlate service.
//!
//! Everything here crosses a process boundary: conversation messages arrive
//! from the browser, feedback records come back from the tracing service.
//! The serde representations are therefore the contract and must stay
//! stable across crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ── Conversation ─────────────────────────────────────────────────────────────

/// Author of a chat message.
///
/// Serialized lowercase (`"human"` / `"assistant"`), matching what the chat
/// window sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
}

impl Role {
    /// Display prefix used when flattening a conversation into a transcript.
    pub fn prefix(&self) -> &'static str {
        match self {
            Role::Human => "Human",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single message in the conversation. Immutable once created; the ordered
/// sequence of messages forms the conversation and the last element is the
/// current turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

// ── Feedback ─────────────────────────────────────────────────────────────────

/// Category of a feedback record.
///
/// `did_copy` is recorded when the user copies the generated code;
/// everything else is an explicit score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    UserScore,
    DidCopy,
}

impl FeedbackType {
    /// Map the raw wire value to a feedback type. Only the literal
    /// `"did_copy"` selects [`FeedbackType::DidCopy`]; any other value
    /// (including absence) is a user score.
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some("did_copy") => FeedbackType::DidCopy,
            _ => FeedbackType::UserScore,
        }
    }
}

/// A desired correction attached to negative feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Correction {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub desired: Option<String>,
}

/// A scored annotation attached to a run, as stored by the tracing service.
///
/// Created once per run on the first score, then mutated through its `id`.
/// Never deleted by this system.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub run_id: Uuid,
    /// Feedback key, e.g. `"user_score"` or `"did_copy"`.
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub correction: Option<Correction>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub modified_at: Option<DateTime<Utc>>,
}

// ── Tests ──────────────────────────────────────────────────────────────────────
