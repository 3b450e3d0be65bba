//! Dispatch - routes outbox entries to handlers.
//!
//! - `EntryHandler` - the handler capability (`applies` / `handle`)
//! - `DispatchRegistry` - ordered handler list with first-failure-aborts dispatch
//! - `DispatchError` - entry-level, retryable failures

mod error;
mod handler;
mod registry;

pub use error::{BoxError, DispatchError};
pub use handler::{ContextHandler, EntryHandler, FnHandler};
pub use registry::DispatchRegistry;
