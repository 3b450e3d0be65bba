use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{SharedClock, SystemClock};

/// Engine configuration, built once at process start and shared by the run
/// loop, the batch processors, and the model handler.
#[derive(Clone)]
pub struct OutboxConfig {
    pub batch_size: usize,
    pub poll_interval: Duration,
    /// Poll interval multiplier applied when a cycle found nothing to do.
    pub idle_delay_multiplier: u32,
    pub lock_ttl: Duration,
    pub causality_key_limit: usize,
    pub raise_not_found_model_error: bool,
    /// Base of the retry backoff, in seconds.
    pub backoff_multiplier: u64,
    pub clock: SharedClock,
}

impl OutboxConfig {
    pub fn new() -> Self {
        Self {
            batch_size: 100,
            poll_interval: Duration::from_millis(500),
            idle_delay_multiplier: 10,
            lock_ttl: Duration::from_millis(10_000),
            causality_key_limit: 10_000,
            raise_not_found_model_error: true,
            backoff_multiplier: 5,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_idle_delay_multiplier(mut self, multiplier: u32) -> Self {
        self.idle_delay_multiplier = multiplier;
        self
    }

    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    pub fn with_causality_key_limit(mut self, limit: usize) -> Self {
        self.causality_key_limit = limit;
        self
    }

    pub fn with_raise_not_found_model_error(mut self, raise: bool) -> Self {
        self.raise_not_found_model_error = raise;
        self
    }

    pub fn with_backoff_multiplier(mut self, seconds: u64) -> Self {
        self.backoff_multiplier = seconds;
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OutboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboxConfig")
            .field("batch_size", &self.batch_size)
            .field("poll_interval", &self.poll_interval)
            .field("idle_delay_multiplier", &self.idle_delay_multiplier)
            .field("lock_ttl", &self.lock_ttl)
            .field("causality_key_limit", &self.causality_key_limit)
            .field("raise_not_found_model_error", &self.raise_not_found_model_error)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .finish_non_exhaustive()
    }
}
