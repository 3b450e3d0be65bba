//! Entry Store - the durable queue of outbox entries.
//!
//! The processors only rely on the semantics described here; a SQL engine
//! implements them with `FOR UPDATE SKIP LOCKED` row locks inside a
//! transaction, `InMemoryOutboxStore` implements them with an acquired-row set.
//!
//! ## Row acquisition
//!
//! Rows returned by a fetch inside one unit of work are owned by it until it
//! commits or is dropped. A concurrent fetch skips owned rows instead of
//! waiting, so parallel workers receive disjoint batches.

mod error;
mod in_memory;

use chrono::{DateTime, Utc};

use crate::entry::{EntryId, NewOutboxEntry, OutboxEntry};

pub use error::StoreError;
pub use in_memory::{InMemoryOutboxStore, InMemoryTransaction};

/// Queries and writes that must run inside one atomic unit of work.
///
/// Writes are visible to others only after [`commit`](Self::commit). Dropping
/// an uncommitted unit of work discards its writes and releases its rows.
pub trait StoreTransaction {
    /// Up to `batch_size` processable entries, oldest `created_at` first,
    /// skipping rows owned by other units of work.
    fn fetch_processable(&mut self, batch_size: usize) -> Result<Vec<OutboxEntry>, StoreError>;

    /// Same as [`fetch_processable`](Self::fetch_processable), restricted to
    /// one causality key. `None` selects entries without a key.
    fn fetch_processable_for_causality_key(
        &mut self,
        batch_size: usize,
        causality_key: Option<&str>,
    ) -> Result<Vec<OutboxEntry>, StoreError>;

    /// Persist the failure fields of one entry.
    fn save(&mut self, entry: &OutboxEntry) -> Result<(), StoreError>;

    /// Set `processed_at = now` and clear every failure field for `ids`.
    /// Idempotent.
    fn mark_processed(&mut self, ids: &[EntryId]) -> Result<(), StoreError>;

    fn commit(self) -> Result<(), StoreError>;
}

/// The durable outbox queue.
pub trait OutboxStore: Send + Sync {
    type Transaction<'a>: StoreTransaction
    where
        Self: 'a;

    /// Open an atomic unit of work.
    fn begin(&self) -> Result<Self::Transaction<'_>, StoreError>;

    /// Cheap existence check for processable entries.
    fn any_processable(&self) -> Result<bool, StoreError>;

    /// Distinct causality keys among processable entries, at most `limit`.
    fn unprocessed_causality_keys(&self, limit: usize) -> Result<Vec<Option<String>>, StoreError>;

    /// Establish or repair the connection to the backing engine.
    fn reconnect(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Append a new entry (producer side).
    fn insert(&self, entry: NewOutboxEntry) -> Result<OutboxEntry, StoreError>;

    fn find(&self, id: EntryId) -> Result<Option<OutboxEntry>, StoreError>;

    /// Entries whose `processed_at` is at or after `since`.
    fn processed_since(&self, since: DateTime<Utc>) -> Result<Vec<OutboxEntry>, StoreError>;

    /// Creation time of the oldest entry not yet processed.
    fn oldest_unprocessed_created_at(&self) -> Result<Option<DateTime<Utc>>, StoreError>;
}
