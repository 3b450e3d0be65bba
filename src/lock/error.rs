use thiserror::Error;

/// Error type for lock operations.
///
/// Any of these escaping a processor is fatal for the worker's run loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The underlying lock primitive was poisoned (a thread panicked while holding it).
    #[error("lock poisoned: {0}")]
    Poisoned(String),
    #[error("lock acquire failed: {0}")]
    AcquireFailed(String),
    #[error("lock release failed: {0}")]
    ReleaseFailed(String),
    /// The lease TTL elapsed, or another holder took the resource over.
    #[error("lock expired: {0}")]
    Expired(String),
    /// The lock backend cannot be reached.
    #[error("lock backend unavailable: {0}")]
    Unavailable(String),
    #[error("lock error: {0}")]
    Other(String),
}
