use thiserror::Error;

use crate::entry::EntryId;

/// Storage-level failure. Never caught by the processors; it terminates the
/// worker's run loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("outbox store unavailable: {0}")]
    Unavailable(String),
    #[error("outbox store lock poisoned during {0}")]
    Poisoned(&'static str),
    #[error("outbox entry {0} not found")]
    NotFound(EntryId),
    #[error("outbox store error: {0}")]
    Other(String),
}
