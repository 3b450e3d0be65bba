//! Transactional outbox processing engine.
//!
//! Domain writes append outbox entries in the same transaction; workers later
//! fetch, dispatch and complete them with at-least-once delivery.

mod backoff;
mod clock;
mod config;
mod error_handler;
mod latency;

pub mod dispatch;
pub mod entry;
pub mod health;
pub mod lock;
pub mod model;
pub mod monitor;
pub mod processor;
pub mod runner;
pub mod store;

pub use backoff::ExponentialBackoff;
pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use config::OutboxConfig;
pub use dispatch::{ContextHandler, DispatchError, DispatchRegistry, EntryHandler, FnHandler};
pub use entry::{EntryId, EventType, EventTypeError, NewOutboxEntry, OutboxEntry, Payload};
pub use error_handler::{ErrorHandler, NullErrorHandler, TracingErrorHandler};
pub use health::{
    FileHeartbeatStore, HealthCheck, HealthError, HeartbeatStore, InMemoryHeartbeatStore,
    HEALTHCHECK_FAILED,
};
pub use latency::{LatencyReport, LatencyTracker};
pub use lock::{InMemoryLockClient, LockClient, LockError, LockLease, NullLockClient};
pub use model::{
    DomainObject, InMemoryModelResolver, ModelHandler, ModelResolver, OutboxEntryFactory,
    ReliableCallback, ReliableCallbacks,
};
pub use monitor::{EventKind, Monitor, MonitorError, Notification};
pub use processor::{
    BatchProcessor, CausalityOrderedProcessor, EntryOutcome, ProcessorError, UnorderedProcessor,
};
pub use runner::{Runner, RunnerSleepInterval, RunnerThread, StopHandle};
pub use store::{InMemoryOutboxStore, OutboxStore, StoreError, StoreTransaction};
