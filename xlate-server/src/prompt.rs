//! Conversation-to-prompt mapping.
//!
//! Two pure pieces: [`format_history`] flattens prior turns into a
//! role-prefixed transcript, and [`select_prompt`] picks the template and
//! variable shape for the current turn. A fresh conversation gets the
//! "initial" translation prompt with the submitted code; every later turn
//! gets the "follow-up" prompt with the transcript and the new question.

use serde::Serialize;

use xlate_types::ChatMessage;

use crate::config::Config;
use crate::error::ServerError;

/// Variables supplied to the remote template.
///
/// Exactly one shape exists per request; the enum makes "never both, never
/// neither" hold by construction. Serializes untagged, so the hub sees the
/// flat `{ code }` or `{ chat_history, question }` object it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PromptVariables {
    Initial { code: String },
    FollowUp { chat_history: String, question: String },
}

/// A selected template reference plus the variables to render it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSelection {
    /// Opaque `owner/name` reference, resolved by the hub client.
    pub template: String,
    pub variables: PromptVariables,
}

/// Flatten messages into one `"Role: content"` line each, original order
/// preserved. Empty input yields the empty string.
pub fn format_history(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.prefix(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Choose the template and variable shape for this conversation.
///
/// A single message means a fresh translation request; anything longer is a
/// follow-up over the transcript of every earlier turn. An empty
/// conversation has no current message to answer and is rejected.
pub fn select_prompt(config: &Config, messages: &[ChatMessage]) -> Result<PromptSelection, ServerError> {
    let Some(current) = messages.last() else {
        return Err(ServerError::BadRequest(
            "conversation must contain at least one message".into(),
        ));
    };

    if messages.len() == 1 {
        return Ok(PromptSelection {
            template: config.initial_prompt.clone(),
            variables: PromptVariables::Initial { code: current.content.clone() },
        });
    }

    Ok(PromptSelection {
        template: config.followup_prompt.clone(),
        variables: PromptVariables::FollowUp {
            chat_history: format_history(&messages[..messages.len() - 1]),
            question: current.content.clone(),
        },
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use xlate_types::Role;

    fn test_config() -> Config {
        Config {
            bind_address: String::new(),
            log_level: String::new(),
            log_json: false,
            cors_allowed_origins: None,
            enable_swagger: false,
            model_base_url: String::new(),
            model_api_key: None,
            model_name: "test".into(),
            hub_base_url: String::new(),
            hub_api_key: None,
            trace_base_url: None,
            trace_api_key: None,
            initial_prompt: "jacob/langchain-python-to-js".into(),
            followup_prompt: "jacob/langchain-python-to-js-follow-up".into(),
            run_start_timeout_secs: 30,
        }
    }

    fn human(content: &str) -> ChatMessage {
        ChatMessage::new(Role::Human, content)
    }

    fn assistant(content: &str) -> ChatMessage {
        ChatMessage::new(Role::Assistant, content)
    }

    #[test]
    fn empty_history_formats_to_empty_string() {
        assert_eq!(format_history(&[]), "");
    }

    #[test]
    fn history_lines_are_role_prefixed_in_order() {
        let text = format_history(&[human("def foo(): pass"), assistant("const foo = ...")]);
        assert_eq!(text, "Human: def foo(): pass\nAssistant: const foo = ...");
    }

    #[test]
    fn history_formatting_is_prefix_stable() {
        let a = human("a");
        let b = assistant("b");
        let before = format_history(&[a.clone(), b.clone()]);
        // Appending a turn and reformatting the prefix yields identical text.
        let _ = format_history(&[a.clone(), b.clone(), human("c")]);
        let after = format_history(&[a, b]);
        assert_eq!(before, after);
    }

    #[test]
    fn single_message_selects_initial_template() {
        let cfg = test_config();
        let sel = select_prompt(&cfg, &[human("def foo(): pass")]).unwrap();
        assert_eq!(sel.template, cfg.initial_prompt);
        assert_eq!(sel.variables, PromptVariables::Initial { code: "def foo(): pass".into() });
    }

    #[test]
    fn longer_conversation_selects_followup_template() {
        let cfg = test_config();
        let sel = select_prompt(
            &cfg,
            &[human("def foo(): pass"), assistant("const foo = ..."), human("use an arrow fn")],
        )
        .unwrap();
        assert_eq!(sel.template, cfg.followup_prompt);
        assert_eq!(
            sel.variables,
            PromptVariables::FollowUp {
                chat_history: "Human: def foo(): pass\nAssistant: const foo = ...".into(),
                question: "use an arrow fn".into(),
            }
        );
    }

    #[test]
    fn two_messages_already_use_followup_shape() {
        let cfg = test_config();
        let sel = select_prompt(&cfg, &[human("x = 1"), human("and in typescript?")]).unwrap();
        assert_eq!(sel.template, cfg.followup_prompt);
        match sel.variables {
            PromptVariables::FollowUp { chat_history, question } => {
                assert_eq!(chat_history, "Human: x = 1");
                assert_eq!(question, "and in typescript?");
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn empty_conversation_is_rejected() {
        let cfg = test_config();
        let err = select_prompt(&cfg, &[]).unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[test]
    fn variables_serialize_flat() {
        let v = serde_json::to_value(PromptVariables::Initial { code: "x".into() }).unwrap();
        assert_eq!(v, serde_json::json!({ "code": "x" }));
        let v = serde_json::to_value(PromptVariables::FollowUp {
            chat_history: "Human: x".into(),
            question: "y".into(),
        })
        .unwrap();
        assert_eq!(v, serde_json::json!({ "chat_history": "Human: x", "question": "y" }));
    }
}
