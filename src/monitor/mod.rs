//! Event bus for run-loop lifecycle and per-entry outcomes.

mod error;
mod event;
#[allow(clippy::module_inception)]
mod monitor;

pub use error::MonitorError;
pub use event::{EventKind, Notification};
pub use monitor::Monitor;
