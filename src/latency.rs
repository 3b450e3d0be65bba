use chrono::TimeDelta;

use crate::clock::SharedClock;
use crate::store::{OutboxStore, StoreError};

/// Delivery latency figures, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyReport {
    pub minimum: f64,
    pub maximum: f64,
    pub average: f64,
    /// Age of the oldest entry still waiting for delivery.
    pub highest_since_creation_date: f64,
}

/// Computes delivery latency over recently processed entries.
pub struct LatencyTracker<S> {
    store: S,
    clock: SharedClock,
}

impl<S: OutboxStore> LatencyTracker<S> {
    pub fn new(store: S, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Latency of entries processed within the last `interval`, plus the age
    /// of the oldest unprocessed entry. Figures are 0 when there is no data.
    pub fn calculate(&self, interval: TimeDelta) -> Result<LatencyReport, StoreError> {
        let now = self.clock.now();
        let since = now.checked_sub_signed(interval).unwrap_or(now);

        let latencies: Vec<f64> = self
            .store
            .processed_since(since)?
            .iter()
            .filter_map(|entry| entry.processing_latency())
            .map(seconds)
            .collect();

        let highest = self
            .store
            .oldest_unprocessed_created_at()?
            .map_or(0.0, |created_at| seconds(now - created_at));

        if latencies.is_empty() {
            return Ok(LatencyReport {
                highest_since_creation_date: highest,
                ..LatencyReport::default()
            });
        }

        let minimum = latencies.iter().copied().fold(f64::INFINITY, f64::min);
        let maximum = latencies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let average = latencies.iter().sum::<f64>() / latencies.len() as f64;

        Ok(LatencyReport {
            minimum,
            maximum,
            average,
            highest_since_creation_date: highest,
        })
    }
}

fn seconds(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}
