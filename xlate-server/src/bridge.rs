//! Run-bridge: gate the HTTP response on the generation run having started.
//!
//! The chat handler must attach the run identifier as a response header, and
//! the identifier only exists once the asynchronous generation pipeline has
//! actually started. [`start_streaming`] spawns the pipeline and hands the
//! response material back only after the pipeline reports its start through
//! a one-shot channel; token bytes flow through an mpsc channel that *is*
//! the response body, so nothing is re-buffered or re-read — the bridge
//! gates when the response is handed off, not what is in it.
//!
//! The wait is bounded: a pipeline that never reports (remote contract
//! violation) fails the request as an upstream error instead of hanging it.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::error::ServerError;

/// One-shot sender the pipeline fires exactly once, when generation has
/// started (`Ok`) or failed before starting (`Err`). `Ok(None)` means the
/// run started without a tracing record; the response header is then empty.
pub type StartSignal = oneshot::Sender<Result<Option<Uuid>, ServerError>>;

/// Sender half of the response body. An `Err` item ends the stream; the
/// status line is already committed by then, so mid-stream failures cannot
/// change it.
pub type TokenSink = mpsc::Sender<Result<Bytes, ServerError>>;

/// A started generation run: the captured identifier and the live body.
#[derive(Debug)]
pub struct StartedRun {
    pub run_id: Option<Uuid>,
    pub body: ReceiverStream<Result<Bytes, ServerError>>,
}

/// Body channel capacity. Bounds how far the pipeline can run ahead of a
/// slow client before backpressure applies.
const BODY_CHANNEL_CAPACITY: usize = 32;

/// Spawn `pipeline` and wait (bounded by `wait`) for its start signal.
///
/// The pipeline receives the [`StartSignal`] and the [`TokenSink`]; it keeps
/// producing into the sink after this function returns, independently of the
/// handler's call stack. If the wait times out or fails, the pipeline task
/// is left to wind down on its own: its next send into the dropped sink
/// fails and the task exits.
pub async fn start_streaming<F, Fut>(wait: Duration, pipeline: F) -> Result<StartedRun, ServerError>
where
    F: FnOnce(StartSignal, TokenSink) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (started_tx, started_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(BODY_CHANNEL_CAPACITY);

    tokio::spawn(pipeline(started_tx, body_tx));

    match tokio::time::timeout(wait, started_rx).await {
        Err(_) => Err(ServerError::RunStartTimeout(wait.as_secs())),
        Ok(Err(_)) => Err(ServerError::Internal(
            "generation task exited before reporting a start".into(),
        )),
        Ok(Ok(Err(e))) => Err(e),
        Ok(Ok(Ok(run_id))) => Ok(StartedRun { run_id, body: ReceiverStream::new(body_rx) }),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
