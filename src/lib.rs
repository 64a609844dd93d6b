//! Walk-forward model training and evaluation for time-ordered price bars
//!
//! Given a raw OHLCV series, the engine engineers indicator and lag
//! features, slides train/test windows forward through time, trains one or
//! more models per window, scores every fold with rmse/mae/mape,
//! aggregates per-model metrics, and persists one deployable artifact per
//! model. Ordered progress events stream to the caller while the job runs,
//! so long trainings stay observable and cancellable.
//!
//! # Modules
//!
//! - [`features`] - indicator computation and feature table assembly
//! - [`folds`] - walk-forward window scheduling
//! - [`models`] - the closed set of model adapters
//! - [`evaluate`] - fold-level error metrics
//! - [`job`] - the orchestrator, progress events and async streaming
//! - [`artifacts`] - artifact store seam and filesystem implementation
//!
//! # Example
//!
//! ```no_run
//! use walkforward::{run_job, Bar, FsArtifactStore, NullSink, TrainingRequest};
//!
//! # fn bars_from_somewhere() -> Vec<Bar> { Vec::new() }
//! let request = TrainingRequest::new(256265, "day")
//!     .with_models(vec!["random_forest".to_string(), "seasonal".to_string()])
//!     .with_windows(300, 60);
//! let bars = bars_from_somewhere();
//! let store = FsArtifactStore::default();
//!
//! let result = run_job(&request, &bars, &store, &NullSink)?;
//! for (name, summary) in &result.models {
//!     println!("{}: rmse {:.4}", name, summary.metrics_overall.rmse);
//! }
//! # Ok::<(), walkforward::EngineError>(())
//! ```

pub mod artifacts;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod folds;
pub mod job;
pub mod models;

pub use artifacts::{load_artifact, ArtifactStore, FsArtifactStore};
pub use config::TrainingRequest;
pub use data::Bar;
pub use error::{EngineError, Result};
pub use evaluate::{evaluate, FoldMetrics};
pub use features::{engineer, FeatureTable};
pub use folds::{schedule, Fold};
pub use job::events::ProgressEvent;
pub use job::sink::{ChannelSink, MemorySink, NullSink, ProgressSink};
pub use job::stream::{run_streaming, TrainingStream};
pub use job::{
    run_job, JobReport, JobResult, ModelReport, ModelResult, ModelSummary, OverallMetrics,
};
pub use models::{FoldData, ModelKind, TrainedModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
