//! Batch runner tests on a synthetic set of towns.

use downtown_algorithms::pipeline::{DowntownParams, ParamsProfile};
use downtown_core::io::{write_feature_collection, write_json_atomic};
use downtown_core::town::{Poi, Town, TownId};
use downtown_core::ErrorKind;
use downtown_parallel::{run_batch, BatchRunner, CancelFlag, FailureRecord, ProcessingMode};
use geo::{polygon, MultiPolygon};
use std::sync::atomic::{AtomicUsize, Ordering};

const EMPTY_TOWN: usize = 6;

fn town(i: usize) -> Town {
    let x0 = i as f64 * 2000.0;
    Town::new(
        format!("town-{:02}", i),
        MultiPolygon::new(vec![polygon![
            (x: x0, y: 0.0),
            (x: x0 + 1000.0, y: 0.0),
            (x: x0 + 1000.0, y: 1000.0),
            (x: x0, y: 1000.0),
        ]]),
    )
}

/// Ten towns side by side; every town but one has a dense corner
fn fixture() -> (Vec<Town>, Vec<Poi>) {
    let towns: Vec<Town> = (0..10).map(town).collect();
    let mut pois = Vec::new();
    for i in (0..10).filter(|&i| i != EMPTY_TOWN) {
        let x0 = i as f64 * 2000.0;
        for k in 0..40 {
            pois.push(Poi::new(x0 + 5.0 + (k % 8) as f64 * 12.0, 5.0 + (k / 8) as f64 * 18.0));
        }
        for (x, y) in [(700.0, 800.0), (300.0, 600.0), (900.0, 250.0), (550.0, 500.0)] {
            pois.push(Poi::new(x0 + x, y));
        }
    }
    (towns, pois)
}

#[test]
fn test_one_empty_town_fails_alone() {
    let (towns, pois) = fixture();
    let report = run_batch(&towns, &pois, DowntownParams::default(), ProcessingMode::Parallel).unwrap();

    assert_eq!(report.successes.len(), 9);
    assert_eq!(report.failures.len(), 1);
    assert!(report.skipped.is_empty());

    let failure = &report.failures[0];
    assert_eq!(failure.town_id, TownId::new(format!("town-{:02}", EMPTY_TOWN)));
    assert_eq!(failure.kind, ErrorKind::Input);
    assert!(!report.successes.contains_key(&failure.town_id));
}

#[test]
fn test_sequential_and_parallel_agree() {
    let (towns, pois) = fixture();
    let params = ParamsProfile::Stabilized.params();

    let sequential = run_batch(&towns, &pois, params.clone(), ProcessingMode::Sequential).unwrap();
    let parallel = run_batch(&towns, &pois, params.clone(), ProcessingMode::Parallel).unwrap();
    let pooled = run_batch(&towns, &pois, params, ProcessingMode::ParallelWith(3)).unwrap();

    assert_eq!(sequential.successes, parallel.successes);
    assert_eq!(sequential.successes, pooled.successes);
    assert_eq!(sequential.failures, parallel.failures);
    assert_eq!(sequential.failures, pooled.failures);
}

#[test]
fn test_cancelled_before_start_skips_everything() {
    let (towns, pois) = fixture();
    let cancel = CancelFlag::new();
    cancel.cancel();

    let report = BatchRunner::new(DowntownParams::default())
        .unwrap()
        .with_mode(ProcessingMode::Sequential)
        .with_cancel(cancel)
        .run(&towns, &pois);

    assert!(report.successes.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(report.skipped.len(), towns.len());
}

#[test]
fn test_cancel_mid_batch_keeps_finished_towns() {
    let (towns, pois) = fixture();
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();
    let runner = BatchRunner::new(DowntownParams::default())
        .unwrap()
        .with_mode(ProcessingMode::Sequential)
        .with_cancel(cancel)
        .with_progress(move |_, _| trigger.cancel());

    let report = runner.run(&towns, &pois);
    assert_eq!(report.successes.len(), 1);
    assert_eq!(report.skipped.len(), towns.len() - 1);
    assert_eq!(report.total(), towns.len());
}

#[test]
fn test_progress_called_once_per_town() {
    let (towns, pois) = fixture();
    let calls = AtomicUsize::new(0);
    let failures = AtomicUsize::new(0);

    BatchRunner::new(DowntownParams::default())
        .unwrap()
        .with_progress(|_, outcome| {
            calls.fetch_add(1, Ordering::SeqCst);
            if outcome.is_err() {
                failures.fetch_add(1, Ordering::SeqCst);
            }
        })
        .run(&towns, &pois);

    assert_eq!(calls.load(Ordering::SeqCst), 10);
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[test]
fn test_artifacts_written_atomically() {
    let (towns, pois) = fixture();
    let report = run_batch(&towns, &pois, DowntownParams::default(), ProcessingMode::Parallel).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("downtowns.geojson");
    let failures = dir.path().join("failures.json");
    write_feature_collection(&report.to_feature_collection(None), &output).unwrap();
    write_json_atomic(&report.failures, &failures).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["features"].as_array().map(|f| f.len()), Some(9));

    let log: Vec<FailureRecord> = serde_json::from_str(&std::fs::read_to_string(&failures).unwrap()).unwrap();
    assert_eq!(log, report.failures);

    // Missing destination directory: error, and nothing left behind
    let missing = dir.path().join("nope").join("downtowns.geojson");
    assert!(write_feature_collection(&report.to_feature_collection(None), &missing).is_err());
    assert!(!missing.exists());
}
