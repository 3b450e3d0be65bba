use std::env;
use std::sync::Arc;

use chrono::TimeDelta;

use super::{FileHeartbeatStore, HealthError, HeartbeatStore};
use crate::clock::{SharedClock, SystemClock};

const KEY_PREFIX: &str = "__transactional_outbox_worker_running__";

/// Returned by [`HealthCheck::check`] when the worker is not alive.
pub const HEALTHCHECK_FAILED: &str = "[Transactional Outbox Worker healthcheck failed]";

/// Liveness reporting for one worker identity.
///
/// The run loop writes heartbeats; a probe calls [`check`](Self::check), which
/// fails when the newest heartbeat is missing or older than the threshold.
#[derive(Clone)]
pub struct HealthCheck {
    store: Arc<dyn HeartbeatStore>,
    identity: String,
    threshold: TimeDelta,
    clock: SharedClock,
}

impl HealthCheck {
    pub fn new(store: Arc<dyn HeartbeatStore>) -> Self {
        Self {
            store,
            identity: default_identity(),
            threshold: TimeDelta::seconds(120),
            clock: Arc::new(SystemClock),
        }
    }

    /// Heartbeats in files under `/tmp`.
    pub fn file_based() -> Self {
        Self::new(Arc::new(FileHeartbeatStore::default()))
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_threshold(mut self, threshold: TimeDelta) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn key(&self) -> String {
        format!("{KEY_PREFIX}{}", self.identity)
    }

    pub fn register_heartbeat(&self) -> Result<(), HealthError> {
        self.store.touch(&self.key(), self.clock.now())
    }

    pub fn worker_stopped(&self) -> Result<(), HealthError> {
        self.store.remove(&self.key())
    }

    pub fn is_healthy(&self) -> Result<bool, HealthError> {
        let Some(last_beat) = self.store.last_beat(&self.key())? else {
            return Ok(false);
        };
        Ok(self.clock.now() - last_beat <= self.threshold)
    }

    /// Empty when healthy, [`HEALTHCHECK_FAILED`] otherwise. Storage errors
    /// count as unhealthy.
    pub fn check(&self) -> String {
        match self.is_healthy() {
            Ok(true) => String::new(),
            Ok(false) => HEALTHCHECK_FAILED.to_string(),
            Err(err) => {
                tracing::warn!(error = %err, key = %self.key(), "heartbeat lookup failed");
                HEALTHCHECK_FAILED.to_string()
            }
        }
    }

    /// Process exit code for an external probe.
    pub fn exit_code(&self) -> i32 {
        if self.check().is_empty() {
            0
        } else {
            1
        }
    }
}

/// `$HOSTNAME`, else the system host name, else `"unknown"`.
pub fn default_identity() -> String {
    env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.is_empty())
        .or_else(|| {
            hostname::get()
                .ok()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
