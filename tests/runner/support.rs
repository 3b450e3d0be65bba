//! Shared fixtures: event log, recording error sink, worker wiring.

#![allow(dead_code)]

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use transactional_outbox::{
    ContextHandler, DispatchError, DispatchRegistry, ErrorHandler, EventKind, InMemoryOutboxStore,
    Monitor, NewOutboxEntry, OutboxConfig, OutboxEntry, OutboxStore, Runner, UnorderedProcessor,
};

pub const CONTEXT: &str = "notifications";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Every notification's kind name and error message, in publish order.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<(EventKind, Option<String>)>>>,
}

impl EventLog {
    pub fn attach(monitor: &Monitor) -> Self {
        let log = Self::default();
        for kind in EventKind::ALL {
            let events = Arc::clone(&log.events);
            monitor.subscribe(kind, move |notification| {
                events
                    .lock()
                    .unwrap()
                    .push((notification.kind, notification.error_message.clone()));
            });
        }
        log
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|(kind, _)| *kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    pub fn messages(&self, kind: EventKind) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .filter_map(|(_, message)| message.clone())
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct RecordingErrorHandler {
    pub captured: Arc<Mutex<Vec<String>>>,
}

impl RecordingErrorHandler {
    pub fn messages(&self) -> Vec<String> {
        self.captured.lock().unwrap().clone()
    }
}

impl ErrorHandler for RecordingErrorHandler {
    fn capture(&self, error: &(dyn Error + 'static)) {
        self.captured.lock().unwrap().push(error.to_string());
    }
}

pub fn fast_config() -> Arc<OutboxConfig> {
    Arc::new(
        OutboxConfig::new()
            .with_poll_interval(Duration::from_millis(5))
            .with_idle_delay_multiplier(2),
    )
}

/// Handler that fails for resource ids starting with `fail`.
pub fn registry() -> DispatchRegistry {
    DispatchRegistry::new().with_handler(ContextHandler::new(CONTEXT, |entry: &OutboxEntry| {
        if entry.resource_id.starts_with("fail") {
            Err(DispatchError::failed_with("SmtpError", "mailbox unavailable"))
        } else {
            Ok(())
        }
    }))
}

pub fn insert(store: &InMemoryOutboxStore, resource_id: &str) -> OutboxEntry {
    store
        .insert(NewOutboxEntry::new("User", resource_id, "user_created", CONTEXT))
        .unwrap()
}

pub fn runner(
    store: &InMemoryOutboxStore,
    errors: &RecordingErrorHandler,
) -> (Runner<UnorderedProcessor<InMemoryOutboxStore>>, EventLog) {
    runner_with(store, errors, registry(), fast_config())
}

pub fn runner_with(
    store: &InMemoryOutboxStore,
    errors: &RecordingErrorHandler,
    registry: DispatchRegistry,
    config: Arc<OutboxConfig>,
) -> (Runner<UnorderedProcessor<InMemoryOutboxStore>>, EventLog) {
    let processor = UnorderedProcessor::new(store.clone(), registry, Arc::clone(&config));
    let runner = Runner::new(processor, config).with_error_handler(Arc::new(errors.clone()));
    let log = EventLog::attach(runner.monitor());
    (runner, log)
}

/// Poll `condition` until it holds or two seconds pass.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
