//! Async streaming wrapper
//!
//! Runs the synchronous orchestrator on a blocking worker and exposes its
//! progress as a channel. Dropping or closing the stream cancels the job
//! after the in-flight fold.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::events::ProgressEvent;
use super::sink::ChannelSink;
use super::{run_job, JobResult};
use crate::artifacts::ArtifactStore;
use crate::config::TrainingRequest;
use crate::data::Bar;
use crate::error::{EngineError, Result};

/// Handle to a running job: ordered events plus the final result
pub struct TrainingStream {
    events: mpsc::UnboundedReceiver<ProgressEvent>,
    handle: JoinHandle<Result<JobResult>>,
}

impl TrainingStream {
    /// Next event, or None once the job has emitted its terminal event and
    /// hung up
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// Stop listening without tearing the stream down. The running job
    /// finishes its in-flight fold and schedules nothing more; events
    /// already buffered can still be received.
    pub fn close(&mut self) {
        self.events.close();
    }

    /// Wait for the job and return its result
    pub async fn join(self) -> Result<JobResult> {
        let TrainingStream { events, handle } = self;
        let result = handle
            .await
            .map_err(|err| EngineError::AdapterFailure(format!("training task failed: {}", err)))?;
        drop(events);
        result
    }
}

/// Start a job on the blocking pool and stream its progress.
///
/// The request and bars move into the worker; the returned stream yields
/// every event in emission order and `join` surfaces the job's result.
pub fn run_streaming(
    request: TrainingRequest,
    bars: Vec<Bar>,
    store: Arc<dyn ArtifactStore + Send + Sync>,
) -> TrainingStream {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::task::spawn_blocking(move || {
        let sink = ChannelSink::new(tx);
        let result = run_job(&request, &bars, store.as_ref(), &sink);
        debug!(ok = result.is_ok(), "training job worker finished");
        result
    });

    TrainingStream { events: rx, handle }
}
