//! Integration tests for `SimulationController`
//!
//! Runs real actors on short intervals against mock sinks and batch
//! sources, then checks the exported log against the pool.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::sync::Arc;
use std::time::{Duration, Instant};
use ticket_pool_core::config::{BatchRange, ConfigError, SimulationConfig};
use ticket_pool_core::persistence::TransactionSink;
use ticket_pool_core::record::{ActionKind, TicketRecord};
use ticket_pool_runtime::{
    ExportStatus, JsonFileSink, RandomBatches, SimulationController, SimulationError,
    SimulationSummary, StartOutcome, StopOutcome,
};
use ticket_pool_testing::helpers::{assert_log_replays, init_test_tracing, test_config};
use ticket_pool_testing::{FailingSink, FixedBatches, InMemorySink, ScriptedBatches};

// ============================================================================
// Fixtures
// ============================================================================

fn controller_with(
    config: SimulationConfig,
    sink: Arc<dyn TransactionSink>,
) -> SimulationController {
    init_test_tracing();
    SimulationController::new(config, sink, Arc::new(RandomBatches)).unwrap()
}

async fn stop(controller: &mut SimulationController) -> SimulationSummary {
    match controller.stop().await {
        StopOutcome::Stopped(summary) => summary,
        StopOutcome::NotRunning => panic!("controller should have been running"),
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_start_run_stop_exports_whole_log() {
    let sink = InMemorySink::new();
    let mut controller = controller_with(test_config(), Arc::new(sink.clone()));

    assert_eq!(
        controller.start(),
        StartOutcome::Started { vendors: 5, customers: 3 }
    );
    assert!(controller.is_running());
    assert_eq!(controller.start(), StartOutcome::AlreadyRunning);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let summary = stop(&mut controller).await;

    assert!(!controller.is_running());
    assert_eq!(summary.reports.len(), 8);
    assert!(summary.unfinished.is_empty());
    assert!(summary.log_verified());
    assert!(summary.transaction_count > 0);

    let exported = sink.last_export().expect("stop should export");
    assert_eq!(exported.len(), summary.transaction_count);
    assert_eq!(exported, controller.pool().snapshot_transactions().await);
    assert_log_replays(10, 30, &exported, summary.final_count);
    assert!(exported.iter().all(|r| r.remaining_after() <= 30));
    assert_eq!(
        summary.export,
        ExportStatus::Persisted {
            records: exported.len(),
            destination: "memory".to_string(),
        }
    );
}

#[tokio::test]
async fn test_stop_when_idle_is_a_no_op() {
    let sink = InMemorySink::new();
    let mut controller = controller_with(test_config(), Arc::new(sink.clone()));

    assert!(matches!(controller.stop().await, StopOutcome::NotRunning));
    assert_eq!(sink.export_count(), 0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_any_pool_exists() {
    let config = SimulationConfig::new(20, 5, 5, 10);

    let result = SimulationController::new(
        config,
        Arc::new(InMemorySink::new()),
        Arc::new(RandomBatches),
    );

    assert!(matches!(
        result,
        Err(SimulationError::InvalidConfig(ConfigError::CapacityBelowInitial {
            initial: 20,
            capacity: 10,
        }))
    ));
}

#[tokio::test]
async fn test_batch_larger_than_capacity_is_rejected_before_start() {
    let config = SimulationConfig::new(1, 2, 60_000, 2).with_vendor_batch(BatchRange::new(3, 5));

    let result = SimulationController::new(
        config,
        Arc::new(InMemorySink::new()),
        Arc::new(RandomBatches),
    );

    assert!(matches!(
        result,
        Err(SimulationError::InvalidConfig(ConfigError::BatchExceedsCapacity {
            field: "vendor_batch",
            min: 3,
            capacity: 2,
        }))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restart_keeps_pool_and_log() {
    let sink = InMemorySink::new();
    let mut controller = controller_with(test_config(), Arc::new(sink.clone()));

    controller.start();
    tokio::time::sleep(Duration::from_millis(60)).await;
    let first = stop(&mut controller).await;

    assert_eq!(
        controller.start(),
        StartOutcome::Started { vendors: 5, customers: 3 }
    );
    tokio::time::sleep(Duration::from_millis(60)).await;
    let second = stop(&mut controller).await;

    let exports = sink.exports();
    assert_eq!(exports.len(), 2);
    assert!(second.transaction_count >= first.transaction_count);
    assert_eq!(&exports[1][..exports[0].len()], exports[0].as_slice());
    assert_log_replays(10, 30, &exports[1], second.final_count);
}

// ============================================================================
// Stop semantics
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_during_long_interval_is_prompt_and_silent() {
    let sink = InMemorySink::new();
    let config = SimulationConfig::new(5, 60_000, 60_000, 10);
    let mut controller = controller_with(config, Arc::new(sink.clone()));

    controller.start();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let started = Instant::now();
    let summary = stop(&mut controller).await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(summary.transaction_count, 0);
    assert_eq!(summary.final_count, 5);
    assert_eq!(sink.last_export(), Some(Vec::new()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_releases_vendors_blocked_on_full_pool() {
    let sink = InMemorySink::new();
    let config = SimulationConfig::new(10, 1, 60_000, 10).with_vendor_count(3);
    let mut controller = SimulationController::new(
        config,
        Arc::new(sink.clone()),
        Arc::new(FixedBatches::new(2)),
    )
    .unwrap();

    controller.start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let summary = stop(&mut controller).await;

    assert!(summary.unfinished.is_empty());
    let vendors: Vec<_> = summary
        .reports
        .iter()
        .filter(|r| r.name.starts_with("Vendor-"))
        .collect();
    assert_eq!(vendors.len(), 3);
    assert!(vendors.iter().all(|r| r.add_cancelled && r.actions_committed == 0));
    assert_eq!(summary.transaction_count, 0);
    assert_eq!(summary.final_count, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sink_failure_is_reported_not_raised() {
    let sink = FailingSink::always();
    let mut controller = controller_with(test_config(), Arc::new(sink.clone()));

    controller.start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let summary = stop(&mut controller).await;

    assert!(!summary.exported());
    assert!(matches!(
        &summary.export,
        ExportStatus::Failed { destination, .. } if destination == "failing"
    ));
    assert_eq!(sink.attempts(), 1);
    assert_eq!(
        controller.pool().transaction_count().await,
        summary.transaction_count
    );
    assert!(summary.to_string().contains("Failed to save transactions"));
}

// ============================================================================
// Scripted runs
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scripted_vendor_fills_to_capacity() {
    let sink = InMemorySink::new();
    let config = SimulationConfig::new(1, 2, 60_000, 41)
        .with_vendor_count(1)
        .with_customer_count(1)
        .with_vendor_batch(BatchRange::new(1, 10));
    let mut controller = SimulationController::new(
        config,
        Arc::new(sink.clone()),
        Arc::new(ScriptedBatches::new([10])),
    )
    .unwrap();

    controller.start();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let summary = stop(&mut controller).await;

    let records = sink.last_export().unwrap();
    let remaining: Vec<_> = records.iter().map(TicketRecord::remaining_after).collect();
    assert_eq!(remaining, [11, 21, 31, 41]);
    assert!(records.iter().all(|r| r.action_kind() == ActionKind::Add));
    assert_eq!(summary.final_count, 41);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_json_export_matches_pool_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transactions.json");
    let mut controller = controller_with(test_config(), Arc::new(JsonFileSink::new(&path)));

    controller.start();
    tokio::time::sleep(Duration::from_millis(80)).await;
    let summary = stop(&mut controller).await;

    assert!(summary.exported());
    let text = std::fs::read_to_string(&path).unwrap();
    let written: Vec<TicketRecord> = serde_json::from_str(&text).unwrap();
    assert_eq!(written, controller.pool().snapshot_transactions().await);
}
