//! Batch processors - the two fetch/dispatch strategies.
//!
//! - `UnorderedProcessor` - one unit of work over the oldest processable entries
//! - `CausalityOrderedProcessor` - per-key units of work under a distributed lock
//!
//! Both isolate dispatch failures per entry and propagate store and lock
//! failures as `ProcessorError`.

mod batch;
mod error;
mod ordered;
mod unordered;

pub use batch::{BatchProcessor, EntryOutcome};
pub use error::ProcessorError;
pub use ordered::{lock_name, CausalityOrderedProcessor};
pub use unordered::UnorderedProcessor;
