use thiserror::Error;

use crate::lock::LockError;
use crate::store::StoreError;

/// Batch-level failure. Never recovered inside a processor; the run loop
/// reports it and terminates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Lock(#[from] LockError),
}
