use std::time::Duration;

/// Exponential retry delay for failed outbox entries.
///
/// `backoff_for(multiplier, attempts) = multiplier * 2^attempts` seconds.
/// Pure and deterministic; saturates instead of overflowing for very large
/// attempt counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialBackoff;

impl ExponentialBackoff {
    /// Delay in whole seconds.
    pub fn backoff_for(multiplier: u64, attempts: u32) -> u64 {
        let factor = 1u64.checked_shl(attempts).unwrap_or(u64::MAX);
        multiplier.saturating_mul(factor)
    }

    /// Same as [`backoff_for`](Self::backoff_for), as a `Duration`.
    pub fn delay(multiplier: u64, attempts: u32) -> Duration {
        Duration::from_secs(Self::backoff_for(multiplier, attempts))
    }
}
