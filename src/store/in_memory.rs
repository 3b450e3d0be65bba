use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use super::{OutboxStore, StoreError, StoreTransaction};
use crate::clock::{SharedClock, SystemClock};
use crate::entry::{EntryId, NewOutboxEntry, OutboxEntry};

struct StoreState {
    entries: BTreeMap<EntryId, OutboxEntry>,
    /// Rows currently owned by an open unit of work.
    acquired: HashSet<EntryId>,
    next_id: u64,
}

/// In-memory outbox store with skip-locked row acquisition.
///
/// Cloning creates another handle to the same storage, so one store can be
/// shared by several worker threads.
#[derive(Clone)]
pub struct InMemoryOutboxStore {
    state: Arc<RwLock<StoreState>>,
    clock: SharedClock,
    available: Arc<AtomicBool>,
}

impl InMemoryOutboxStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        InMemoryOutboxStore {
            state: Arc::new(RwLock::new(StoreState {
                entries: BTreeMap::new(),
                acquired: HashSet::new(),
                next_id: 1,
            })),
            clock,
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate losing (or regaining) the backing engine. While unavailable
    /// every operation fails with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Every entry, in id order.
    pub fn all(&self) -> Result<Vec<OutboxEntry>, StoreError> {
        let state = self.read("all")?;
        Ok(state.entries.values().cloned().collect())
    }

    /// Number of rows currently owned by open units of work.
    pub fn acquired_count(&self) -> Result<usize, StoreError> {
        Ok(self.read("acquired_count")?.acquired.len())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("connection lost".into()))
        }
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, StoreState>, StoreError> {
        self.check_available()?;
        self.state
            .read()
            .map_err(|_| StoreError::Poisoned(operation))
    }

    fn write(
        &self,
        operation: &'static str,
    ) -> Result<RwLockWriteGuard<'_, StoreState>, StoreError> {
        self.check_available()?;
        self.state
            .write()
            .map_err(|_| StoreError::Poisoned(operation))
    }

    fn processable<'s>(
        state: &'s StoreState,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &'s OutboxEntry> + 's {
        state
            .entries
            .values()
            .filter(move |entry| entry.is_processable_at(now))
    }
}

impl Default for InMemoryOutboxStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboxStore for InMemoryOutboxStore {
    type Transaction<'a> = InMemoryTransaction<'a>;

    fn begin(&self) -> Result<InMemoryTransaction<'_>, StoreError> {
        self.check_available()?;
        Ok(InMemoryTransaction {
            store: self,
            acquired: Vec::new(),
            writes: Vec::new(),
            finished: false,
        })
    }

    fn any_processable(&self) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let state = self.read("any_processable")?;
        let found = Self::processable(&state, now).next().is_some();
        Ok(found)
    }

    fn unprocessed_causality_keys(&self, limit: usize) -> Result<Vec<Option<String>>, StoreError> {
        let now = self.clock.now();
        let state = self.read("unprocessed_causality_keys")?;

        let mut candidates: Vec<&OutboxEntry> = Self::processable(&state, now).collect();
        candidates.sort_by_key(|entry| (entry.created_at, entry.id));

        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for entry in candidates {
            if keys.len() >= limit {
                break;
            }
            if seen.insert(entry.causality_key.clone()) {
                keys.push(entry.causality_key.clone());
            }
        }
        Ok(keys)
    }

    fn reconnect(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    fn insert(&self, entry: NewOutboxEntry) -> Result<OutboxEntry, StoreError> {
        let now = self.clock.now();
        let mut state = self.write("insert")?;
        let id = EntryId::new(state.next_id);
        state.next_id += 1;

        let entry = entry.into_entry(id, now);
        state.entries.insert(id, entry.clone());
        Ok(entry)
    }

    fn find(&self, id: EntryId) -> Result<Option<OutboxEntry>, StoreError> {
        Ok(self.read("find")?.entries.get(&id).cloned())
    }

    fn processed_since(&self, since: DateTime<Utc>) -> Result<Vec<OutboxEntry>, StoreError> {
        let state = self.read("processed_since")?;
        Ok(state
            .entries
            .values()
            .filter(|entry| entry.processed_at.map_or(false, |at| at >= since))
            .cloned()
            .collect())
    }

    fn oldest_unprocessed_created_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let state = self.read("oldest_unprocessed_created_at")?;
        Ok(state
            .entries
            .values()
            .filter(|entry| entry.processed_at.is_none())
            .map(|entry| entry.created_at)
            .min())
    }
}

enum PendingWrite {
    Save(OutboxEntry),
    MarkProcessed(Vec<EntryId>, DateTime<Utc>),
}

/// Unit of work over an [`InMemoryOutboxStore`].
///
/// Writes are buffered and applied on commit; acquired rows are released on
/// commit or drop.
pub struct InMemoryTransaction<'a> {
    store: &'a InMemoryOutboxStore,
    acquired: Vec<EntryId>,
    writes: Vec<PendingWrite>,
    finished: bool,
}

impl InMemoryTransaction<'_> {
    fn acquire<F>(&mut self, batch_size: usize, filter: F) -> Result<Vec<OutboxEntry>, StoreError>
    where
        F: Fn(&OutboxEntry) -> bool,
    {
        let now = self.store.clock.now();
        let mut guard = self.store.write("fetch_processable")?;
        let StoreState {
            entries, acquired, ..
        } = &mut *guard;

        let mut candidates: Vec<&OutboxEntry> = entries
            .values()
            .filter(|entry| entry.is_processable_at(now))
            .filter(|entry| !acquired.contains(&entry.id))
            .filter(|entry| filter(*entry))
            .collect();
        candidates.sort_by_key(|entry| (entry.created_at, entry.id));

        let batch: Vec<OutboxEntry> = candidates.into_iter().take(batch_size).cloned().collect();
        for entry in &batch {
            acquired.insert(entry.id);
            self.acquired.push(entry.id);
        }
        Ok(batch)
    }

    fn release(&mut self, state: &mut StoreState) {
        for id in self.acquired.drain(..) {
            state.acquired.remove(&id);
        }
    }
}

impl StoreTransaction for InMemoryTransaction<'_> {
    fn fetch_processable(&mut self, batch_size: usize) -> Result<Vec<OutboxEntry>, StoreError> {
        self.acquire(batch_size, |_| true)
    }

    fn fetch_processable_for_causality_key(
        &mut self,
        batch_size: usize,
        causality_key: Option<&str>,
    ) -> Result<Vec<OutboxEntry>, StoreError> {
        self.acquire(batch_size, |entry| entry.causality_key.as_deref() == causality_key)
    }

    fn save(&mut self, entry: &OutboxEntry) -> Result<(), StoreError> {
        self.store.check_available()?;
        self.writes.push(PendingWrite::Save(entry.clone()));
        Ok(())
    }

    fn mark_processed(&mut self, ids: &[EntryId]) -> Result<(), StoreError> {
        self.store.check_available()?;
        if !ids.is_empty() {
            let now = self.store.clock.now();
            self.writes.push(PendingWrite::MarkProcessed(ids.to_vec(), now));
        }
        Ok(())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let store = self.store;
        let mut state = store.write("commit")?;

        for write in std::mem::take(&mut self.writes) {
            match write {
                PendingWrite::Save(saved) => {
                    let entry = state
                        .entries
                        .get_mut(&saved.id)
                        .ok_or(StoreError::NotFound(saved.id))?;
                    entry.failed_at = saved.failed_at;
                    entry.error_class = saved.error_class;
                    entry.error_message = saved.error_message;
                    entry.attempts = saved.attempts;
                    entry.retry_at = saved.retry_at;
                    entry.updated_at = saved.updated_at;
                }
                PendingWrite::MarkProcessed(ids, at) => {
                    for id in ids {
                        if let Some(entry) = state.entries.get_mut(&id) {
                            if !entry.is_processed() {
                                entry.mark_processed(at);
                            }
                        }
                    }
                }
            }
        }

        self.release(&mut state);
        self.finished = true;
        Ok(())
    }
}

impl Drop for InMemoryTransaction<'_> {
    fn drop(&mut self) {
        if self.finished || self.acquired.is_empty() {
            return;
        }
        let store = self.store;
        let mut state = match store.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.release(&mut state);
    }
}
