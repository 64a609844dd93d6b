//! Progress events emitted while a job runs

use serde::{Deserialize, Serialize};

use super::{JobReport, ModelResult, OverallMetrics};

/// Discrete progress notifications, externally tagged for transport as
/// `{"type": "...", ...}`.
///
/// Events are strictly ordered: a listener observes exactly the sequence a
/// sequential execution would produce, with per-fold events ascending
/// within each model and models in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Job accepted, fold plan computed
    Start {
        models: Vec<String>,
        total_folds: usize,
    },
    /// Named model is about to run
    ModelStart { model: String, total_folds: usize },
    /// One fold finished for one model
    Fold { model: String, data: ModelResult },
    /// Model abandoned; the job moves on to the next one
    ModelSkipped { model: String, reason: String },
    /// Model finished every fold and its artifact is stored
    ModelComplete {
        model: String,
        metrics: OverallMetrics,
    },
    /// Terminal: full report over all successful models
    Complete { results: JobReport },
    /// Terminal: the job failed before producing any model
    Error { detail: String },
}

impl ProgressEvent {
    /// Tag string as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Start { .. } => "start",
            ProgressEvent::ModelStart { .. } => "model_start",
            ProgressEvent::Fold { .. } => "fold",
            ProgressEvent::ModelSkipped { .. } => "model_skipped",
            ProgressEvent::ModelComplete { .. } => "model_complete",
            ProgressEvent::Complete { .. } => "complete",
            ProgressEvent::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. }
        )
    }
}
