use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use transactional_outbox::{
    ContextHandler, DispatchRegistry, EventKind, HealthCheck, InMemoryHeartbeatStore,
    InMemoryOutboxStore, OutboxConfig, OutboxEntry, OutboxStore, ProcessorError, RunnerThread,
    StoreError, HEALTHCHECK_FAILED,
};

use crate::support::{
    fast_config, init_tracing, insert, registry, runner, runner_with, wait_until,
    RecordingErrorHandler, CONTEXT,
};

#[test]
fn processes_entries_and_publishes_outcomes() {
    init_tracing();
    let store = InMemoryOutboxStore::new();
    let delivered = insert(&store, "1");
    let failing = insert(&store, "fail-2");
    let errors = RecordingErrorHandler::default();
    let (runner, log) = runner(&store, &errors);

    let worker = RunnerThread::spawn(runner);
    assert!(wait_until(|| log.count(EventKind::Heartbeat) >= 2));
    worker.stop().unwrap();

    assert!(store.find(delivered.id).unwrap().unwrap().is_processed());
    let failed = store.find(failing.id).unwrap().unwrap();
    assert!(!failed.is_processed());
    assert_eq!(failed.attempts, 1);

    let kinds = log.kinds();
    assert_eq!(kinds.first(), Some(&EventKind::Started));
    assert_eq!(kinds.last(), Some(&EventKind::ShuttingDown));
    assert!(kinds.contains(&EventKind::Stopped));
    assert_eq!(log.count(EventKind::RecordProcessed), 1);
    assert_eq!(log.count(EventKind::RecordProcessingFailed), 1);
    assert_eq!(
        log.messages(EventKind::RecordProcessingFailed),
        vec!["mailbox unavailable".to_string()]
    );
    assert_eq!(errors.messages(), vec!["mailbox unavailable".to_string()]);
}

#[test]
fn picks_up_entries_written_while_running() {
    let store = InMemoryOutboxStore::new();
    let errors = RecordingErrorHandler::default();
    let (runner, log) = runner(&store, &errors);
    let worker = RunnerThread::spawn(runner);

    assert!(wait_until(|| log.count(EventKind::Heartbeat) >= 1));
    let late = insert(&store, "late");
    assert!(wait_until(|| store.find(late.id).unwrap().unwrap().is_processed()));

    worker.stop().unwrap();
}

#[test]
fn store_outage_terminates_the_thread() {
    init_tracing();
    let store = InMemoryOutboxStore::new();
    let errors = RecordingErrorHandler::default();
    let (runner, log) = runner(&store, &errors);
    let worker = RunnerThread::spawn(runner);

    assert!(wait_until(|| log.count(EventKind::Heartbeat) >= 1));
    store.set_available(false);
    assert!(wait_until(|| worker.is_finished()));

    let err = worker.join().unwrap_err();
    assert!(matches!(err, ProcessorError::Store(StoreError::Unavailable(_))));
    assert_eq!(log.count(EventKind::Error), 1);
    assert_eq!(errors.messages().len(), 1);
}

#[test]
fn heartbeats_drive_the_health_check() {
    let store = InMemoryOutboxStore::new();
    let errors = RecordingErrorHandler::default();
    let health =
        HealthCheck::new(Arc::new(InMemoryHeartbeatStore::new())).with_identity("runner-test");
    assert_eq!(health.check(), HEALTHCHECK_FAILED);

    let (runner, _log) = runner(&store, &errors);
    let worker = RunnerThread::spawn(runner.with_health_check(health.clone()));

    assert!(wait_until(|| health.check().is_empty()));
    assert_eq!(health.exit_code(), 0);

    worker.stop().unwrap();
    assert_eq!(health.check(), HEALTHCHECK_FAILED);
    assert_eq!(health.exit_code(), 1);
}

#[test]
fn stop_during_a_batch_lets_the_batch_finish() {
    init_tracing();
    let store = InMemoryOutboxStore::new();
    let entries = vec![insert(&store, "gate"), insert(&store, "2"), insert(&store, "3")];

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let entered_tx = Mutex::new(entered_tx);
    let release_rx = Mutex::new(release_rx);
    let gated = DispatchRegistry::new().with_handler(ContextHandler::new(
        CONTEXT,
        move |entry: &OutboxEntry| {
            if entry.resource_id == "gate" {
                let _ = entered_tx.lock().unwrap().send(());
                let _ = release_rx.lock().unwrap().recv();
            }
            Ok(())
        },
    ));

    let errors = RecordingErrorHandler::default();
    let (runner, log) = runner_with(&store, &errors, gated, fast_config());
    let worker = RunnerThread::spawn(runner);

    entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    worker.signal_stop();
    thread::sleep(Duration::from_millis(20));
    release_tx.send(()).unwrap();
    worker.join().unwrap();

    for entry in &entries {
        assert!(store.find(entry.id).unwrap().unwrap().is_processed());
    }
    assert_eq!(log.count(EventKind::RecordProcessed), entries.len());
    assert_eq!(log.kinds().last(), Some(&EventKind::ShuttingDown));
}

#[test]
fn unbounded_idle_interval_still_stops() {
    let store = InMemoryOutboxStore::new();
    let errors = RecordingErrorHandler::default();
    let config = Arc::new(
        OutboxConfig::new()
            .with_poll_interval(Duration::MAX)
            .with_idle_delay_multiplier(10),
    );
    let (runner, log) = runner_with(&store, &errors, registry(), config);
    let worker = RunnerThread::spawn(runner);

    assert!(wait_until(|| log.count(EventKind::Heartbeat) >= 1));
    worker.stop().unwrap();

    assert_eq!(log.kinds().last(), Some(&EventKind::ShuttingDown));
}
