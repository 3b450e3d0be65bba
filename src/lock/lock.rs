use std::time::Duration;

use chrono::{DateTime, Utc};

use super::LockError;

/// A granted, time-bounded claim on a named resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockLease {
    pub resource: String,
    /// Unique per grant; release only succeeds for the matching token.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Client for a distributed, TTL-bounded mutual-exclusion primitive.
///
/// Acquisition never blocks: a resource held by someone else yields
/// `Ok(None)`. Backend failures are errors. A crashed holder's lease lapses
/// after its TTL.
pub trait LockClient: Send + Sync {
    fn try_acquire(&self, resource: &str, ttl: Duration) -> Result<Option<LockLease>, LockError>;

    fn release(&self, lease: &LockLease) -> Result<(), LockError>;
}

impl<L: LockClient + ?Sized> LockClient for std::sync::Arc<L> {
    fn try_acquire(&self, resource: &str, ttl: Duration) -> Result<Option<LockLease>, LockError> {
        (**self).try_acquire(resource, ttl)
    }

    fn release(&self, lease: &LockLease) -> Result<(), LockError> {
        (**self).release(lease)
    }
}

/// Run `f` while holding `resource`.
///
/// Returns `Ok(None)` without calling `f` when the resource is held elsewhere.
/// A lease that lapsed while `f` ran is logged and otherwise ignored; `f` has
/// already finished by then.
pub fn with_lock<C, T, F>(
    client: &C,
    resource: &str,
    ttl: Duration,
    f: F,
) -> Result<Option<T>, LockError>
where
    C: LockClient + ?Sized,
    F: FnOnce() -> T,
{
    let Some(lease) = client.try_acquire(resource, ttl)? else {
        tracing::debug!(resource, "lock held elsewhere");
        return Ok(None);
    };

    let value = f();

    match client.release(&lease) {
        Ok(()) => Ok(Some(value)),
        Err(LockError::Expired(reason)) => {
            tracing::warn!(resource, %reason, "lock lease lapsed before release");
            Ok(Some(value))
        }
        Err(err) => Err(err),
    }
}

/// Like [`with_lock`], for fallible work.
///
/// When `f` fails, a failed release is logged and `f`'s error is returned.
pub fn try_with_lock<C, T, E, F>(
    client: &C,
    resource: &str,
    ttl: Duration,
    f: F,
) -> Result<Option<T>, E>
where
    C: LockClient + ?Sized,
    E: From<LockError> + std::fmt::Display,
    F: FnOnce() -> Result<T, E>,
{
    let Some(lease) = client.try_acquire(resource, ttl)? else {
        tracing::debug!(resource, "lock held elsewhere");
        return Ok(None);
    };

    let result = f();

    match (client.release(&lease), result) {
        (Ok(()), result) => result.map(Some),
        (Err(LockError::Expired(reason)), result) => {
            tracing::warn!(resource, %reason, "lock lease lapsed before release");
            result.map(Some)
        }
        (Err(release_error), Err(error)) => {
            tracing::warn!(
                resource,
                %release_error,
                %error,
                "lock release failed after work failed"
            );
            Err(error)
        }
        (Err(release_error), Ok(_)) => Err(release_error.into()),
    }
}
