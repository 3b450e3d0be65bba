use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::RunnerSleepInterval;
use crate::config::OutboxConfig;
use crate::error_handler::{ErrorHandler, NullErrorHandler};
use crate::health::HealthCheck;
use crate::monitor::{EventKind, Monitor, Notification};
use crate::processor::{BatchProcessor, ProcessorError};

/// Upper bound on one uninterrupted sleep slice, so a stop request does not
/// wait out a long idle interval.
const SLEEP_SLICE: Duration = Duration::from_millis(25);

/// Signals a running [`Runner`] to stop. Cheap to clone and `Send`.
#[derive(Clone)]
pub struct StopHandle {
    runner_id: Uuid,
    should_stop: Arc<AtomicBool>,
    monitor: Monitor,
    health: Option<HealthCheck>,
}

impl StopHandle {
    /// Request a stop. Takes effect at the next loop boundary; a batch in
    /// flight runs to completion.
    pub fn stop(&self) {
        tracing::info!(runner_id = %self.runner_id, "stopping");
        self.monitor.emit(EventKind::Stopped);
        self.should_stop.store(true, Ordering::SeqCst);
        if let Some(health) = &self.health {
            if let Err(err) = health.worker_stopped() {
                tracing::warn!(
                    runner_id = %self.runner_id,
                    error = %err,
                    "failed to clear heartbeat"
                );
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.should_stop.load(Ordering::SeqCst)
    }
}

/// Polling loop driving one batch processor.
///
/// `start` blocks the calling thread until stopped or until a batch-level
/// error escapes the processor. Such errors are captured by the error
/// handler, published as `error`, and returned.
///
/// Stopping is terminal: a later `start` reaches the stop boundary right away
/// and returns. Build a new runner to resume.
pub struct Runner<P> {
    id: Uuid,
    processor: P,
    config: Arc<OutboxConfig>,
    monitor: Monitor,
    error_handler: Arc<dyn ErrorHandler>,
    health: Option<HealthCheck>,
    should_stop: Arc<AtomicBool>,
}

impl<P: BatchProcessor> Runner<P> {
    pub fn new(processor: P, config: Arc<OutboxConfig>) -> Self {
        Self {
            id: Uuid::new_v4(),
            processor,
            config,
            monitor: Monitor::new(),
            error_handler: Arc::new(NullErrorHandler),
            health: None,
            should_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_monitor(mut self, monitor: Monitor) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = handler;
        self
    }

    pub fn with_health_check(mut self, health: HealthCheck) -> Self {
        self.health = Some(health);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            runner_id: self.id,
            should_stop: Arc::clone(&self.should_stop),
            monitor: self.monitor.clone(),
            health: self.health.clone(),
        }
    }

    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    pub fn start(&self) -> Result<(), ProcessorError> {
        tracing::info!(runner_id = %self.id, "started");
        self.monitor.emit(EventKind::Started);
        self.register_heartbeat();

        let result = self.run();
        if let Err(err) = &result {
            self.error_handler.capture(err);
            tracing::error!(runner_id = %self.id, error = %err, "outbox worker terminated");
            self.monitor
                .instrument(&Notification::new(EventKind::Error).with_error(err));
        }
        result
    }

    fn run(&self) -> Result<(), ProcessorError> {
        self.processor.reconnect()?;

        loop {
            if self.should_stop.load(Ordering::SeqCst) {
                self.monitor.emit(EventKind::ShuttingDown);
                tracing::info!(runner_id = %self.id, "shutting down");
                self.clear_heartbeat();
                return Ok(());
            }

            let attempted = self.process_entries()?;
            self.monitor.emit(EventKind::Heartbeat);
            self.register_heartbeat();

            self.sleep(RunnerSleepInterval::interval_for(
                attempted,
                self.config.poll_interval,
                self.config.idle_delay_multiplier,
            ));
        }
    }

    fn process_entries(&self) -> Result<usize, ProcessorError> {
        let attempted = self.processor.call(&mut |entry, outcome| match outcome {
            Ok(()) => {
                tracing::debug!(
                    runner_id = %self.id,
                    entry_id = %entry.id,
                    context = %entry.context,
                    event_name = %entry.event_name,
                    "processed"
                );
                self.monitor
                    .instrument(&Notification::new(EventKind::RecordProcessed).with_entry(entry));
            }
            Err(error) => {
                tracing::error!(
                    runner_id = %self.id,
                    entry_id = %entry.id,
                    context = %entry.context,
                    event_name = %entry.event_name,
                    attempts = entry.attempts,
                    error = %error,
                    "failed to process"
                );
                self.monitor.instrument(
                    &Notification::new(EventKind::RecordProcessingFailed)
                        .with_entry(entry)
                        .with_error(&**error),
                );
                self.error_handler.capture(&**error);
            }
        })?;
        Ok(attempted.len())
    }

    fn register_heartbeat(&self) {
        if let Some(health) = &self.health {
            if let Err(err) = health.register_heartbeat() {
                tracing::warn!(runner_id = %self.id, error = %err, "failed to register heartbeat");
            }
        }
    }

    /// A beat may land after `StopHandle::stop` cleared it; clear again on exit.
    fn clear_heartbeat(&self) {
        if let Some(health) = &self.health {
            if let Err(err) = health.worker_stopped() {
                tracing::warn!(runner_id = %self.id, error = %err, "failed to clear heartbeat");
            }
        }
    }

    /// An interval past what `Instant` can represent sleeps until stopped.
    fn sleep(&self, interval: Duration) {
        let deadline = Instant::now().checked_add(interval);
        while !self.should_stop.load(Ordering::SeqCst) {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => SLEEP_SLICE,
            };
            if remaining.is_zero() {
                break;
            }
            thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }
}
