use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use super::{LockClient, LockError, LockLease};
use crate::clock::{SharedClock, SystemClock};

struct Held {
    token: String,
    expires_at: DateTime<Utc>,
}

/// In-memory lock client backed by a `HashMap<String, Held>`.
///
/// One entry per held resource; an entry past its `expires_at` counts as
/// free. Cloning shares the table, so clones behave like several clients
/// talking to one backend.
#[derive(Clone)]
pub struct InMemoryLockClient {
    locks: Arc<Mutex<HashMap<String, Held>>>,
    clock: SharedClock,
    available: Arc<AtomicBool>,
}

impl InMemoryLockClient {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        InMemoryLockClient {
            locks: Arc::new(Mutex::new(HashMap::new())),
            clock,
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate a backend outage (or recovery).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Whether `resource` is held by an unexpired lease.
    pub fn is_locked(&self, resource: &str) -> Result<bool, LockError> {
        let now = self.clock.now();
        let locks = self
            .locks
            .lock()
            .map_err(|_| LockError::Poisoned("lock table poisoned".into()))?;
        Ok(locks.get(resource).map_or(false, |held| held.expires_at > now))
    }

    fn check_available(&self) -> Result<(), LockError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LockError::Unavailable("lock backend offline".into()))
        }
    }
}

impl Default for InMemoryLockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LockClient for InMemoryLockClient {
    fn try_acquire(&self, resource: &str, ttl: Duration) -> Result<Option<LockLease>, LockError> {
        self.check_available()?;
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|e| LockError::AcquireFailed(format!("invalid ttl: {e}")))?;
        let now = self.clock.now();

        let mut locks = self
            .locks
            .lock()
            .map_err(|_| LockError::Poisoned("lock table poisoned".into()))?;

        if let Some(held) = locks.get(resource) {
            if held.expires_at > now {
                return Ok(None);
            }
        }

        let lease = LockLease {
            resource: resource.to_string(),
            token: Uuid::new_v4().to_string(),
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        locks.insert(
            resource.to_string(),
            Held {
                token: lease.token.clone(),
                expires_at: lease.expires_at,
            },
        );
        Ok(Some(lease))
    }

    fn release(&self, lease: &LockLease) -> Result<(), LockError> {
        self.check_available()?;
        let now = self.clock.now();
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| LockError::Poisoned("lock table poisoned".into()))?;

        match locks.get(&lease.resource) {
            Some(held) if held.token == lease.token => {
                let expired = held.expires_at <= now;
                locks.remove(&lease.resource);
                if expired {
                    Err(LockError::Expired(lease.resource.clone()))
                } else {
                    Ok(())
                }
            }
            _ => Err(LockError::Expired(lease.resource.clone())),
        }
    }
}
