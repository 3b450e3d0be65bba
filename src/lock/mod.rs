//! Distributed lock abstraction used to serialize work per causality key.
//!
//! - `LockClient` - non-blocking, TTL-bounded acquire plus token-checked release
//! - `NullLockClient` - always grants
//! - `InMemoryLockClient` - process-local client honoring TTLs against a `Clock`

mod error;
mod in_memory;
#[allow(clippy::module_inception)]
mod lock;
mod null;

pub use error::LockError;
pub use in_memory::InMemoryLockClient;
pub use lock::{try_with_lock, with_lock, LockClient, LockLease};
pub use null::NullLockClient;
