//! Job orchestration
//!
//! Drives the feature engineer, fold scheduler, model adapters, evaluator
//! and artifact store across one request. Per-fold metrics stream out
//! through the caller's sink while each model runs; a model that fails
//! anywhere is skipped without touching its siblings, and only models that
//! complete every fold make it into the result.

pub mod events;
pub mod sink;
pub mod stream;

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::artifacts::ArtifactStore;
use crate::config::TrainingRequest;
use crate::data::Bar;
use crate::error::{EngineError, Result};
use crate::evaluate::evaluate;
use crate::features::{engineer, FeatureTable};
use crate::folds::{schedule, Fold};
use crate::models::{FoldData, ModelKind, TrainedModel};
use events::ProgressEvent;
use sink::ProgressSink;

/// One fold's outcome for one model. Window boundaries are the inclusive
/// timestamps of the first and last row on each side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResult {
    pub fold: usize,
    pub total_folds: usize,
    pub train_start: DateTime<Utc>,
    pub train_end: DateTime<Utc>,
    pub test_start: DateTime<Utc>,
    pub test_end: DateTime<Utc>,
    pub rmse: f64,
    pub mae: f64,
    pub mape: Option<f64>,
}

/// Unweighted means across folds. `mape` averages only the folds where it
/// was defined and is None when no fold had one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub mape: Option<f64>,
}

/// Per-model aggregate over the whole schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub metrics_overall: OverallMetrics,
    pub walk_forward: Vec<ModelResult>,
    /// Opaque reference returned by the artifact store
    pub artifact_path: String,
    /// Wall time for the model's whole fold loop including persistence
    pub training_time_seconds: f64,
}

/// Models that completed every scheduled fold, keyed by requested name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobResult {
    pub models: BTreeMap<String, ModelSummary>,
}

impl JobResult {
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ModelSummary> {
        self.models.get(name)
    }
}

/// Payload of the terminal `complete` event: job identity plus the
/// successful models in request order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub instrument_token: u64,
    pub interval: String,
    pub forecast_horizon: usize,
    pub models: Vec<ModelReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReport {
    pub model_name: String,
    pub metrics_overall: OverallMetrics,
    pub walk_forward: Vec<ModelResult>,
    pub artifact_path: String,
    pub training_time_seconds: f64,
}

impl JobReport {
    /// Assemble the report in the request's model order
    pub fn from_result(request: &TrainingRequest, result: &JobResult) -> Self {
        let models = request
            .models
            .iter()
            .filter_map(|name| {
                result.models.get(name).map(|summary| ModelReport {
                    model_name: name.clone(),
                    metrics_overall: summary.metrics_overall,
                    walk_forward: summary.walk_forward.clone(),
                    artifact_path: summary.artifact_path.clone(),
                    training_time_seconds: summary.training_time_seconds,
                })
            })
            .collect();
        Self {
            instrument_token: request.instrument_token,
            interval: request.interval.clone(),
            forecast_horizon: request.forecast_horizon,
            models,
        }
    }
}

/// Run a training job to completion, emitting progress into `sink`.
///
/// Fatal errors (invalid request, insufficient history, impossible fold
/// plan) produce a terminal `error` event and an Err before any model
/// runs. Per-model failures surface as `model_skipped` events and never
/// abort sibling models. A sink whose listener is gone stops the job after
/// the in-flight fold; models already completed keep their entries in the
/// returned result.
pub fn run_job(
    request: &TrainingRequest,
    bars: &[Bar],
    store: &dyn ArtifactStore,
    sink: &dyn ProgressSink,
) -> Result<JobResult> {
    match prepare(request, bars) {
        Ok((table, plan)) => Ok(run_prepared(request, &table, &plan, store, sink)),
        Err(err) => {
            warn!(error = %err, "training job rejected");
            sink.emit(ProgressEvent::Error {
                detail: err.to_string(),
            });
            Err(err)
        }
    }
}

fn prepare(request: &TrainingRequest, bars: &[Bar]) -> Result<(FeatureTable, Vec<Fold>)> {
    request.validate()?;
    let table = engineer(bars, request.forecast_horizon, request.min_feature_rows())?;
    let plan = schedule(
        table.len(),
        request.train_bars,
        request.test_bars,
        request.step_size,
    );
    if plan.is_empty() {
        return Err(EngineError::NoFoldsPossible {
            train_bars: request.train_bars,
            test_bars: request.test_bars,
            rows: table.len(),
        });
    }
    Ok((table, plan))
}

fn run_prepared(
    request: &TrainingRequest,
    table: &FeatureTable,
    plan: &[Fold],
    store: &dyn ArtifactStore,
    sink: &dyn ProgressSink,
) -> JobResult {
    let total_folds = plan.len();
    info!(
        instrument_token = request.instrument_token,
        interval = %request.interval,
        feature_rows = table.len(),
        total_folds,
        models = request.models.len(),
        "starting walk-forward job"
    );

    let mut listening = sink.emit(ProgressEvent::Start {
        models: request.models.clone(),
        total_folds,
    });
    let mut result = JobResult::default();

    for name in &request.models {
        if !listening {
            warn!(model = %name, "listener disconnected, job winding down");
            break;
        }

        listening = sink.emit(ProgressEvent::ModelStart {
            model: name.clone(),
            total_folds,
        });

        match run_model(name, request, table, plan, store, sink, &mut listening) {
            Ok(Some(summary)) => {
                info!(
                    model = %name,
                    rmse = summary.metrics_overall.rmse,
                    folds = summary.walk_forward.len(),
                    seconds = summary.training_time_seconds,
                    "model complete"
                );
                listening = sink.emit(ProgressEvent::ModelComplete {
                    model: name.clone(),
                    metrics: summary.metrics_overall,
                }) && listening;
                result.models.insert(name.clone(), summary);
            }
            Ok(None) => {
                warn!(model = %name, "job cancelled mid-model, partial folds discarded");
                break;
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(model = %name, reason = %reason, "model skipped");
                listening = sink.emit(ProgressEvent::ModelSkipped {
                    model: name.clone(),
                    reason,
                }) && listening;
            }
        }
    }

    if listening {
        sink.emit(ProgressEvent::Complete {
            results: JobReport::from_result(request, &result),
        });
    }
    result
}

/// Run every fold for one model, then persist the last fold's state.
///
/// Ok(None) means the listener disappeared partway through: already
/// computed folds are discarded and no summary is produced. Any error is
/// model-local by the time it leaves here.
fn run_model(
    name: &str,
    request: &TrainingRequest,
    table: &FeatureTable,
    plan: &[Fold],
    store: &dyn ArtifactStore,
    sink: &dyn ProgressSink,
    listening: &mut bool,
) -> Result<Option<ModelSummary>> {
    let started = Instant::now();
    let kind = ModelKind::resolve(name)?;
    let total_folds = plan.len();

    let mut records: Vec<ModelResult> = Vec::with_capacity(total_folds);
    let mut last_trained: Option<TrainedModel> = None;

    for fold in plan {
        if !*listening {
            debug!(model = name, fold = fold.index, "abandoning remaining folds");
            return Ok(None);
        }

        let data = fold_data(table, fold);
        let trained = kind
            .train(&data, request.seed, &request.interval)
            .map_err(adapter_error)?;
        let predictions = trained.predict(&data).map_err(adapter_error)?;
        let metrics = evaluate(table.target_rows(fold.test.clone()), predictions.view());

        let record = ModelResult {
            fold: fold.index,
            total_folds,
            train_start: table.timestamp_at(fold.train.start),
            train_end: table.timestamp_at(fold.train.end - 1),
            test_start: table.timestamp_at(fold.test.start),
            test_end: table.timestamp_at(fold.test.end - 1),
            rmse: metrics.rmse,
            mae: metrics.mae,
            mape: metrics.mape,
        };
        debug!(
            model = name,
            fold = fold.index,
            rmse = record.rmse,
            mae = record.mae,
            "fold complete"
        );

        *listening = sink.emit(ProgressEvent::Fold {
            model: name.to_string(),
            data: record.clone(),
        });
        records.push(record);
        last_trained = Some(trained);
    }

    let trained = match last_trained {
        Some(trained) => trained,
        // empty plans are rejected before any model runs
        None => return Ok(None),
    };

    let artifact_path = store
        .persist(&trained, request.instrument_token, &request.interval, name)
        .map_err(|err| {
            EngineError::AdapterFailure(format!("artifact persistence failed: {}", err))
        })?;

    Ok(Some(summarize(
        records,
        artifact_path,
        started.elapsed().as_secs_f64(),
    )))
}

fn fold_data<'a>(table: &'a FeatureTable, fold: &Fold) -> FoldData<'a> {
    FoldData {
        train_x: table.feature_rows(fold.train.clone()),
        train_y: table.target_rows(fold.train.clone()),
        test_x: table.feature_rows(fold.test.clone()),
        train_close: table.close_rows(fold.train.clone()),
        test_len: fold.test_len(),
    }
}

/// Keep model-local errors as they are, wrap anything else so the job sees
/// a skippable failure instead of a fatal one.
fn adapter_error(err: EngineError) -> EngineError {
    if err.is_model_local() {
        err
    } else {
        EngineError::AdapterFailure(err.to_string())
    }
}

fn summarize(
    records: Vec<ModelResult>,
    artifact_path: String,
    training_time_seconds: f64,
) -> ModelSummary {
    let n = records.len() as f64;
    let rmse = records.iter().map(|r| r.rmse).sum::<f64>() / n;
    let mae = records.iter().map(|r| r.mae).sum::<f64>() / n;
    let defined: Vec<f64> = records
        .iter()
        .filter_map(|r| r.mape)
        .filter(|m| m.is_finite())
        .collect();
    let mape = if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    };

    ModelSummary {
        metrics_overall: OverallMetrics { rmse, mae, mape },
        walk_forward: records,
        artifact_path,
        training_time_seconds,
    }
}
