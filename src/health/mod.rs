//! Worker liveness: heartbeats written by the run loop, read by a probe.

mod check;
mod error;
mod store;

pub use check::{default_identity, HealthCheck, HEALTHCHECK_FAILED};
pub use error::HealthError;
pub use store::{FileHeartbeatStore, HeartbeatStore, InMemoryHeartbeatStore};
