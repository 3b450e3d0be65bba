use std::time::Duration;

/// How long the run loop sleeps between cycles.
pub struct RunnerSleepInterval;

impl RunnerSleepInterval {
    /// `sleep` after a cycle that attempted entries, `sleep * idle_multiplier`
    /// after an idle one.
    pub fn interval_for(attempted: usize, sleep: Duration, idle_multiplier: u32) -> Duration {
        if attempted > 0 {
            sleep
        } else {
            sleep.saturating_mul(idle_multiplier)
        }
    }
}
