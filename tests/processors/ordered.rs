use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use transactional_outbox::{
    processor::lock_name, BatchProcessor, CausalityOrderedProcessor, DispatchError,
    DispatchRegistry, EntryHandler, InMemoryLockClient, InMemoryOutboxStore,
    OutboxConfig, OutboxEntry, OutboxStore,
};

use crate::support::{Fixture, RecordingHandler, CONTEXT};

type Ordered = CausalityOrderedProcessor<InMemoryOutboxStore, InMemoryLockClient>;

fn processor(
    fixture: &Fixture,
    lock: &InMemoryLockClient,
    handler: impl EntryHandler + 'static,
) -> Ordered {
    CausalityOrderedProcessor::new(
        fixture.store.clone(),
        lock.clone(),
        DispatchRegistry::new().with_handler(handler),
        Arc::clone(&fixture.config),
    )
}

#[test]
fn same_key_entries_follow_creation_order() {
    let fixture = Fixture::new();
    fixture.insert_at(20, "second", Some("order-1"));
    fixture.insert_at(10, "first", Some("order-1"));
    fixture.at(100);
    let handler = RecordingHandler::new();

    processor(&fixture, &InMemoryLockClient::new(), handler.clone())
        .process()
        .unwrap();

    assert_eq!(handler.resource_ids(), vec!["first", "second"]);
}

#[test]
fn failure_does_not_block_other_keys() {
    let fixture = Fixture::new();
    let broken = fixture.insert_at(0, "a1", Some("a"));
    let healthy = fixture.insert_at(1, "b1", Some("b"));
    fixture.at(10);
    let handler = RecordingHandler::new();
    handler.fail_for("a1");

    let attempted = processor(&fixture, &InMemoryLockClient::new(), handler)
        .process()
        .unwrap();

    assert_eq!(attempted.len(), 2);
    assert!(!fixture.find(&broken).is_processed());
    assert_eq!(fixture.find(&broken).attempts, 1);
    assert!(fixture.find(&healthy).is_processed());
}

#[test]
fn key_scan_is_capped() {
    let fixture = Fixture::with_config(OutboxConfig::new().with_causality_key_limit(1));
    fixture.insert_at(0, "a1", Some("a"));
    fixture.insert_at(1, "b1", Some("b"));
    fixture.at(10);
    let handler = RecordingHandler::new();
    let processor = processor(&fixture, &InMemoryLockClient::new(), handler.clone());

    assert_eq!(processor.process().unwrap().len(), 1);
    assert_eq!(processor.process().unwrap().len(), 1);
    assert_eq!(handler.resource_ids(), vec!["a1", "b1"]);
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
fn concurrent_call_skips_a_key_held_by_another_worker() {
    let fixture = Fixture::new();
    fixture.insert_at(0, "k1", Some("k"));
    fixture.insert_at(1, "k2", Some("k"));
    fixture.at(10);
    let lock = InMemoryLockClient::new();

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gate = GateHandler {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let holder = processor(&fixture, &lock, gate);
    let worker = thread::spawn(move || holder.process().unwrap());

    assert_eq!(entered_rx.recv().unwrap(), "k1");
    assert!(lock.is_locked(&lock_name(Some("k"))).unwrap());

    let handler = RecordingHandler::new();
    let contender = processor(&fixture, &lock, handler.clone());
    assert!(contender.process().unwrap().is_empty());
    assert!(handler.resource_ids().is_empty());

    release_tx.send(()).unwrap();
    assert_eq!(entered_rx.recv().unwrap(), "k2");
    release_tx.send(()).unwrap();

    assert_eq!(worker.join().unwrap().len(), 2);
    assert!(!lock.is_locked(&lock_name(Some("k"))).unwrap());
    assert!(contender.process().unwrap().is_empty());
}

/// Records dispatch order and sleeps a random few hundred microseconds to
/// shake up thread interleaving.
#[derive(Clone, Default)]
struct JitteryHandler {
    log: Arc<Mutex<Vec<OutboxEntry>>>,
}

impl EntryHandler for JitteryHandler {
    fn applies(&self, entry: &OutboxEntry) -> bool {
        entry.context == CONTEXT
    }

    fn handle(&self, entry: &OutboxEntry) -> Result<(), DispatchError> {
        let pause = rand::thread_rng().gen_range(0..300);
        thread::sleep(Duration::from_micros(pause));
        self.log.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[test]
fn creation_order_holds_across_randomized_interleavings() {
    let mut rng = rand::thread_rng();

    for _round in 0..10 {
        let fixture = Fixture::with_config(OutboxConfig::new().with_batch_size(3));
        let lock = InMemoryLockClient::new();

        let mut offsets: Vec<i64> = (0..40).collect();
        offsets.shuffle(&mut rng);
        for (n, offset) in offsets.into_iter().enumerate() {
            let key = format!("key-{}", rng.gen_range(0..4));
            fixture.insert_at(offset, &format!("entry-{n}"), Some(&key));
        }
        fixture.at(1_000);

        let handler = JitteryHandler::default();
        let workers: Vec<_> = (0..3)
            .map(|_| {
                let processor = processor(&fixture, &lock, handler.clone());
                let store = fixture.store.clone();
                thread::spawn(move || {
                    for _ in 0..5_000 {
                        if !store.any_processable().unwrap() {
                            break;
                        }
                        if processor.process().unwrap().is_empty() {
                            thread::sleep(Duration::from_micros(100));
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(!fixture.store.any_processable().unwrap());

        let log = handler.log.lock().unwrap();
        let unique: HashSet<_> = log.iter().map(|entry| entry.id).collect();
        assert_eq!(unique.len(), 40);
        assert_eq!(log.len(), 40, "every entry dispatched exactly once");

        let mut per_key: HashMap<Option<String>, Vec<_>> = HashMap::new();
        for entry in log.iter() {
            per_key
                .entry(entry.causality_key.clone())
                .or_default()
                .push(entry.created_at);
        }
        for (key, created) in per_key {
            assert!(
                created.windows(2).all(|pair| pair[0] < pair[1]),
                "{key:?} dispatched out of order: {created:?}"
            );
        }
    }
}
