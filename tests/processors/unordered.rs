use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::TimeDelta;
use transactional_outbox::{
    BatchProcessor, Clock, DispatchError, DispatchRegistry, EntryHandler, ExponentialBackoff,
    OutboxConfig, OutboxEntry, OutboxStore, UnorderedProcessor,
};

use crate::support::{Fixture, RecordingHandler, CONTEXT};

fn processor(
    fixture: &Fixture,
    handler: &RecordingHandler,
) -> UnorderedProcessor<transactional_outbox::InMemoryOutboxStore> {
    let registry = DispatchRegistry::new().with_handler(handler.clone());
    UnorderedProcessor::new(fixture.store.clone(), registry, Arc::clone(&fixture.config))
}

#[test]
fn second_entry_fails_first_is_processed() {
    let fixture = Fixture::new();
    let handler = RecordingHandler::new();
    handler.fail_for("2");
    let first = fixture.insert_at(0, "1", None);
    let second = fixture.insert_at(1, "2", None);
    fixture.at(10);

    let attempted = processor(&fixture, &handler).process().unwrap();

    assert_eq!(attempted.len(), 2);
    let first = fixture.find(&first);
    let second = fixture.find(&second);
    assert!(first.processed_at.is_some());
    assert!(second.processed_at.is_none());
    assert!(second.retry_at.unwrap() > fixture.clock.now());
    assert_eq!(second.error_class.as_deref(), Some("DeliveryFailed"));
    assert_eq!(second.error_message.as_deref(), Some("could not deliver order 2"));

    let failed = attempted.iter().find(|entry| entry.id == second.id).unwrap();
    assert_eq!(failed.error().unwrap().to_string(), "could not deliver order 2");
}

#[test]
fn retry_schedule_follows_backoff() {
    let fixture = Fixture::new();
    let handler = RecordingHandler::new();
    handler.fail_for("1");
    let entry = fixture.insert_at(0, "1", None);
    let processor = processor(&fixture, &handler);

    for attempt in 1..=3u32 {
        let now = fixture.clock.now();
        assert_eq!(processor.process().unwrap().len(), 1);

        let stored = fixture.find(&entry);
        let delay = ExponentialBackoff::backoff_for(fixture.config.backoff_multiplier, attempt);
        assert_eq!(stored.attempts, attempt);
        assert_eq!(stored.retry_at, Some(now + TimeDelta::seconds(delay as i64)));

        assert!(processor.process().unwrap().is_empty());
        fixture.clock.set(stored.retry_at.unwrap());
    }

    handler.recover("1");
    assert_eq!(processor.process().unwrap().len(), 1);
    let stored = fixture.find(&entry);
    assert!(stored.is_processed());
    assert!(stored.retry_at.is_none());
    assert!(stored.error_class.is_none());
    assert_eq!(stored.attempts, 3);
    assert_eq!(handler.resource_ids().len(), 4);
}

#[test]
fn batches_respect_size_and_creation_order() {
    let fixture = Fixture::with_config(OutboxConfig::new().with_batch_size(2));
    let handler = RecordingHandler::new();
    fixture.insert_at(30, "c", None);
    fixture.insert_at(10, "a", None);
    fixture.insert_at(20, "b", None);
    fixture.at(100);
    let processor = processor(&fixture, &handler);

    assert_eq!(processor.process().unwrap().len(), 2);
    assert_eq!(processor.process().unwrap().len(), 1);
    assert!(processor.process().unwrap().is_empty());

    assert_eq!(handler.resource_ids(), vec!["a", "b", "c"]);
}

#[test]
fn entries_for_unknown_contexts_are_retried_not_dropped() {
    let fixture = Fixture::new();
    let entry = fixture
        .store
        .insert(transactional_outbox::NewOutboxEntry::new(
            "Invoice",
            "9",
            "invoice_created",
            "billing",
        ))
        .unwrap();
    let processor = processor(&fixture, &RecordingHandler::new());

    let attempted = processor.process().unwrap();

    assert!(matches!(
        attempted[0].error().as_deref(),
        Some(DispatchError::NoHandlerFound { .. })
    ));
    let stored = fixture.find(&entry);
    assert_eq!(stored.error_class.as_deref(), Some("NoHandlerFound"));
    assert!(!stored.is_processed());
}

/// Parks inside dispatch until told to continue.
struct GateHandler {
    entered: Mutex<mpsc::Sender<String>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl EntryHandler for GateHandler {
    fn applies(&self, entry: &OutboxEntry) -> bool {
        entry.context == CONTEXT
    }

    fn handle(&self, entry: &OutboxEntry) -> Result<(), DispatchError> {
        self.entered.lock().unwrap().send(entry.resource_id.clone()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Ok(())
    }
}

#[test]
fn concurrent_workers_receive_disjoint_batches() {
    let fixture = Fixture::with_config(OutboxConfig::new().with_batch_size(2));
    for (offset, id) in ["1", "2", "3", "4"].iter().enumerate() {
        fixture.insert_at(offset as i64, id, None);
    }
    fixture.at(100);

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gate = GateHandler {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let blocked = UnorderedProcessor::new(
        fixture.store.clone(),
        DispatchRegistry::new().with_handler(gate),
        Arc::clone(&fixture.config),
    );
    let worker = thread::spawn(move || blocked.process().unwrap());

    assert_eq!(entered_rx.recv().unwrap(), "1");

    let handler = RecordingHandler::new();
    let other = processor(&fixture, &handler).process().unwrap();
    assert_eq!(handler.resource_ids(), vec!["3", "4"]);
    assert_eq!(other.len(), 2);

    release_tx.send(()).unwrap();
    assert_eq!(entered_rx.recv().unwrap(), "2");
    release_tx.send(()).unwrap();
    let first = worker.join().unwrap();

    let first_ids: Vec<&str> = first.iter().map(|e| e.resource_id.as_str()).collect();
    assert_eq!(first_ids, vec!["1", "2"]);
    assert!(!fixture.store.any_processable().unwrap());
}
