//! Client for the remote prompt hub.
//!
//! Prompts are stored remotely as versioned manifests keyed by an
//! `owner/name` reference. A manifest declares the variables its templates
//! expect, so the variable names are an explicit contract checked at render
//! time rather than an implicit string-keyed map.
//!
//! # Example
//! ```rust,no_run
//! # async fn demo() -> Result<(), xlate_hub::HubError> {
//! use xlate_hub::HubClient;
//! let hub = HubClient::new("https://api.hub.langchain.com", None);
//! let manifest = hub.pull("jacob/langchain-python-to-js").await?;
//! let rendered = manifest.render(&serde_json::json!({ "code": "def foo(): pass" }))?;
//! # Ok(()) }
//! ```

use minijinja::Environment;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors returned by hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// The prompt reference was not of the form `owner/name`.
    #[error("invalid prompt reference {reference:?}: expected \"owner/name\"")]
    InvalidReference { reference: String },

    /// An HTTP request failed (network error, TLS failure, timeout).
    #[error("hub request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The hub answered with a non-success status.
    #[error("hub returned {status} for {reference:?}: {body}")]
    Status {
        reference: String,
        status: u16,
        body: String,
    },

    /// The manifest body could not be decoded.
    #[error("malformed prompt manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// A variable declared by the manifest was not supplied at render time.
    #[error("missing prompt variable {name:?} for template {template:?}")]
    MissingVariable { template: String, name: String },

    /// Template rendering failed.
    #[error("template render failed: {0}")]
    Render(#[from] minijinja::Error),
}

/// A single templated message inside a prompt manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    /// `"system"`, `"human"`, or `"assistant"`.
    pub role: String,
    /// Message body; may reference declared variables as `{{ name }}`.
    pub content: String,
}

/// A versioned prompt pulled from the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptManifest {
    /// Reference this manifest was pulled from, e.g. `"jacob/langchain-python-to-js"`.
    #[serde(default)]
    pub reference: String,
    /// Variables every render call must supply.
    pub input_variables: Vec<String>,
    /// Ordered message templates.
    pub messages: Vec<PromptMessage>,
}

impl PromptManifest {
    /// Render every message body with the supplied variables.
    ///
    /// Fails with [`HubError::MissingVariable`] before touching the template
    /// engine if any declared variable is absent, so the contract violation
    /// is reported by name instead of as a generic render error.
    pub fn render(&self, vars: &serde_json::Value) -> Result<Vec<PromptMessage>, HubError> {
        for name in &self.input_variables {
            if vars.get(name).is_none() {
                return Err(HubError::MissingVariable {
                    template: self.reference.clone(),
                    name: name.clone(),
                });
            }
        }

        let env = Environment::new();
        let ctx = minijinja::Value::from_serialize(vars);
        self.messages
            .iter()
            .map(|m| {
                Ok(PromptMessage {
                    role: m.role.clone(),
                    content: env.render_str(&m.content, &ctx)?,
                })
            })
            .collect()
    }
}

/// Client for the prompt hub REST API.
///
/// Process-wide: construct once at startup and share; the underlying
/// connection pool is reused across requests.
#[derive(Debug, Clone)]
pub struct HubClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HubClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key,
        }
    }

    /// Pull the latest commit of the prompt at `reference` (`"owner/name"`).
    ///
    /// The hub stores template bodies; this client fetches them fresh on
    /// every call and does not cache.
    pub async fn pull(&self, reference: &str) -> Result<PromptManifest, HubError> {
        let (owner, name) = split_reference(reference)?;
        let url = format!("{}/prompts/{}/{}/latest", self.base_url, owner, name);
        debug!(reference, %url, "pulling prompt manifest");

        let mut req = self.http.get(&url);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HubError::Status {
                reference: reference.to_owned(),
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let mut manifest: PromptManifest = serde_json::from_str(&body)?;
        manifest.reference = reference.to_owned();
        Ok(manifest)
    }
}

/// Split an `owner/name` prompt reference into its parts.
fn split_reference(reference: &str) -> Result<(&str, &str), HubError> {
    match reference.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(HubError::InvalidReference { reference: reference.to_owned() }),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn manifest() -> PromptManifest {
        PromptManifest {
            reference: "jacob/langchain-python-to-js".into(),
            input_variables: vec!["code".into()],
            messages: vec![
                PromptMessage {
                    role: "system".into(),
                    content: "You are a highly experienced developer.".into(),
                },
                PromptMessage {
                    role: "human".into(),
                    content: "Convert this:\n```python\n{{ code }}\n```".into(),
                },
            ],
        }
    }

    #[test]
    fn render_substitutes_variables() {
        let rendered = manifest().render(&json!({ "code": "def foo(): pass" })).unwrap();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].content, "You are a highly experienced developer.");
        assert!(rendered[1].content.contains("def foo(): pass"));
        assert!(!rendered[1].content.contains("{{"));
    }

    #[test]
    fn render_rejects_missing_variable_by_name() {
        let err = manifest().render(&json!({ "question": "why?" })).unwrap_err();
        match err {
            HubError::MissingVariable { name, template } => {
                assert_eq!(name, "code");
                assert_eq!(template, "jacob/langchain-python-to-js");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn render_allows_extra_variables() {
        let rendered = manifest()
            .render(&json!({ "code": "x = 1", "unused": "y" }))
            .unwrap();
        assert!(rendered[1].content.contains("x = 1"));
    }

    #[test]
    fn follow_up_shape_renders_both_variables() {
        let m = PromptManifest {
            reference: "jacob/langchain-python-to-js-follow-up".into(),
            input_variables: vec!["chat_history".into(), "question".into()],
            messages: vec![PromptMessage {
                role: "human".into(),
                content: "{{ chat_history }}\n\n{{ question }}".into(),
            }],
        };
        let rendered = m
            .render(&json!({ "chat_history": "Human: hi", "question": "again?" }))
            .unwrap();
        assert_eq!(rendered[0].content, "Human: hi\n\nagain?");
    }

    #[test]
    fn split_reference_accepts_owner_name() {
        assert_eq!(split_reference("jacob/py-to-js").unwrap(), ("jacob", "py-to-js"));
    }

    #[test]
    fn split_reference_rejects_malformed() {
        for bad in ["", "jacob", "/name", "owner/", "a/b/c"] {
            assert!(split_reference(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn manifest_decodes_from_hub_json() {
        let raw = r#"{
            "input_variables": ["code"],
            "messages": [{"role": "system", "content": "hi"}]
        }"#;
        let m: PromptManifest = serde_json::from_str(raw).unwrap();
        assert_eq!(m.input_variables, vec!["code"]);
        assert!(m.reference.is_empty());
    }
}
