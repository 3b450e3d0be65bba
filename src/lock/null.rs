use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{LockClient, LockError, LockLease};

/// Always grants. Valid for single-worker deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLockClient;

impl LockClient for NullLockClient {
    fn try_acquire(&self, resource: &str, _ttl: Duration) -> Result<Option<LockLease>, LockError> {
        Ok(Some(LockLease {
            resource: resource.to_string(),
            token: String::new(),
            expires_at: DateTime::<Utc>::MAX_UTC,
        }))
    }

    fn release(&self, _lease: &LockLease) -> Result<(), LockError> {
        Ok(())
    }
}
