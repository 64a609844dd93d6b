//! Streaming orchestration tests

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;
use walkforward::{run_streaming, Bar, FsArtifactStore, ProgressEvent, TrainingRequest};

fn daily_bars(n: usize) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2022, 1, 3, 9, 15, 0).unwrap();
    (0..n)
        .map(|i| {
            let base = 300.0 + i as f64 * 0.1 + (i as f64 * 0.5).sin() * 5.0;
            Bar::filled(
                start + Duration::days(i as i64),
                base - 1.0,
                base + 2.0,
                base - 2.0,
                base,
                60_000.0,
            )
        })
        .collect()
}

fn request_for(models: &[&str]) -> TrainingRequest {
    TrainingRequest::new(408065, "day")
        .with_models(models.iter().map(|m| m.to_string()).collect())
        .with_windows(200, 50)
        .with_step_size(50)
}

#[tokio::test]
async fn test_events_stream_in_order() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FsArtifactStore::new(dir.path()));

    let mut stream = run_streaming(request_for(&["seasonal"]), daily_bars(601), store);

    let mut kinds = Vec::new();
    while let Some(event) = stream.next_event().await {
        kinds.push(event.kind());
    }
    assert_eq!(
        kinds,
        vec![
            "start",
            "model_start",
            "fold",
            "fold",
            "fold",
            "fold",
            "model_complete",
            "complete"
        ]
    );

    let result = stream.join().await.unwrap();
    assert!(result.get("seasonal").is_some());
}

#[tokio::test]
async fn test_fold_events_ascend_within_model() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FsArtifactStore::new(dir.path()));

    let mut stream = run_streaming(request_for(&["seasonal"]), daily_bars(601), store);

    let mut folds = Vec::new();
    while let Some(event) = stream.next_event().await {
        if let ProgressEvent::Fold { data, .. } = event {
            folds.push(data.fold);
        }
    }
    assert_eq!(folds, vec![1, 2, 3, 4]);
    stream.join().await.unwrap();
}

#[tokio::test]
async fn test_closing_the_stream_cancels_remaining_models() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FsArtifactStore::new(dir.path()));

    // seasonal completes quickly; the forest behind it never gets to run
    // once the listener hangs up
    let mut stream = run_streaming(
        request_for(&["seasonal", "random_forest"]),
        daily_bars(601),
        store,
    );

    let mut saw_seasonal_complete = false;
    while let Some(event) = stream.next_event().await {
        if let ProgressEvent::ModelComplete { model, .. } = &event {
            if model == "seasonal" {
                saw_seasonal_complete = true;
                break;
            }
        }
    }
    assert!(saw_seasonal_complete);
    stream.close();

    // buffered events may still drain after close
    while stream.next_event().await.is_some() {}

    let result = stream.join().await.unwrap();
    assert!(result.get("seasonal").is_some());
    assert!(result.get("random_forest").is_none());
}

#[tokio::test]
async fn test_fatal_error_streams_single_error_event() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FsArtifactStore::new(dir.path()));

    let mut stream = run_streaming(request_for(&["seasonal"]), daily_bars(250), store);

    let mut events = Vec::new();
    while let Some(event) = stream.next_event().await {
        events.push(event);
    }
    assert_eq!(events.len(), 1);
    match &events[0] {
        ProgressEvent::Error { detail } => assert!(detail.contains("not enough history")),
        other => panic!("expected error event, got {:?}", other),
    }

    assert!(stream.join().await.is_err());
}

#[tokio::test]
async fn test_complete_event_carries_report() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FsArtifactStore::new(dir.path()));

    let mut stream = run_streaming(request_for(&["seasonal"]), daily_bars(601), store);

    let mut report = None;
    while let Some(event) = stream.next_event().await {
        if let ProgressEvent::Complete { results } = event {
            report = Some(results);
        }
    }
    let report = report.expect("complete event");
    assert_eq!(report.instrument_token, 408065);
    assert_eq!(report.interval, "day");
    assert_eq!(report.forecast_horizon, 1);
    assert_eq!(report.models.len(), 1);
    assert_eq!(report.models[0].model_name, "seasonal");
    assert_eq!(report.models[0].walk_forward.len(), 4);

    stream.join().await.unwrap();
}
