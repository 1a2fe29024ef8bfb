//! Per-request generation pipeline.
//!
//! [`run`] executes one chat turn end to end: pull and render the selected
//! prompt, open the model stream, register the run with the tracing service,
//! signal the bridge that generation has started, then forward token deltas
//! into the response body while accumulating the full output for the run
//! record.

use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use xlate_llm::{ChatCompletionRequest, Message};
use xlate_trace::RunCreate;

use crate::bridge::{StartSignal, TokenSink};
use crate::error::ServerError;
use crate::prompt::PromptSelection;
use crate::state::AppState;

/// Sampling temperature for the translation model. The model is a fine-tune
/// and drifts on anything higher.
const TEMPERATURE: f32 = 0.0;

/// Execute one generation pipeline.
///
/// Failures before the model stream is open go through `started` and become
/// the HTTP error response. Failures after that point flow into `body`; the
/// status line is already committed. The send into a closed `body` fails
/// when the client disconnects, which ends the task.
pub async fn run(
    state: Arc<AppState>,
    selection: PromptSelection,
    started: StartSignal,
    body: TokenSink,
) {
    let vars = match serde_json::to_value(&selection.variables) {
        Ok(v) => v,
        Err(e) => {
            let _ = started.send(Err(ServerError::Internal(e.to_string())));
            return;
        }
    };

    // Pull + render the remote template.
    let manifest = match state.hub.pull(&selection.template).await {
        Ok(m) => m,
        Err(e) => {
            let _ = started.send(Err(e.into()));
            return;
        }
    };
    let rendered = match manifest.render(&vars) {
        Ok(r) => r,
        Err(e) => {
            let _ = started.send(Err(e.into()));
            return;
        }
    };

    // Open the model stream; once this resolves, generation has started.
    let request = ChatCompletionRequest {
        model: state.config.model_name.clone(),
        messages: rendered
            .into_iter()
            .map(|m| Message {
                // The hub stores conversational roles; the model API expects
                // OpenAI's naming.
                role: match m.role.as_str() {
                    "human" => "user".to_owned(),
                    other => other.to_owned(),
                },
                content: m.content,
            })
            .collect(),
        temperature: TEMPERATURE,
        stream: true,
    };
    let mut deltas = match state.llm.stream_chat(&request).await {
        Ok(s) => s,
        Err(e) => {
            let _ = started.send(Err(e.into()));
            return;
        }
    };

    // Register the run so feedback can reference it. A tracing failure is
    // not fatal to the chat turn: the run simply goes unrecorded and the
    // response header stays empty.
    let run_id = register_run(&state, &selection, &vars).await;
    let _ = started.send(Ok(run_id));

    let mut output = String::new();
    while let Some(item) = deltas.next().await {
        match item {
            Ok(delta) => {
                output.push_str(&delta);
                if body.send(Ok(Bytes::from(delta))).await.is_err() {
                    debug!("client disconnected mid-stream");
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "model stream failed mid-generation");
                let _ = body.send(Err(e.into())).await;
                return;
            }
        }
    }

    info!(template = %selection.template, output_len = output.len(), "generation complete");

    if let (Some(trace), Some(id)) = (&state.trace, run_id) {
        if let Err(e) = trace
            .end_run(id, serde_json::json!({ "output": output }))
            .await
        {
            warn!(run_id = %id, error = %e, "failed to record run output");
        }
    }
}

/// Mint a run id and register it with the tracing service, if configured.
async fn register_run(
    state: &AppState,
    selection: &PromptSelection,
    inputs: &serde_json::Value,
) -> Option<Uuid> {
    let trace = state.trace.as_ref()?;
    let run = RunCreate {
        id: Uuid::new_v4(),
        name: selection.template.clone(),
        run_type: "chain".to_owned(),
        inputs: inputs.clone(),
        start_time: Utc::now(),
    };
    match trace.create_run(&run).await {
        Ok(()) => Some(run.id),
        Err(e) => {
            warn!(error = %e, "failed to register run; continuing untraced");
            None
        }
    }
}
