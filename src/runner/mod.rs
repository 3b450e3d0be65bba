//! Run loop - drives a batch processor on a poll interval.
//!
//! States: idle, running, stopping, stopped. Many runners may share one
//! store; coordination happens only through the store's row acquisition and
//! the distributed lock.

#[allow(clippy::module_inception)]
mod runner;
mod sleep_interval;
mod thread;

pub use runner::{Runner, StopHandle};
pub use sleep_interval::RunnerSleepInterval;
pub use thread::RunnerThread;
