use std::sync::Arc;

use super::batch::process_entries;
use super::{BatchProcessor, EntryOutcome, ProcessorError};
use crate::config::OutboxConfig;
use crate::dispatch::DispatchRegistry;
use crate::entry::OutboxEntry;
use crate::lock::{try_with_lock, LockClient};
use crate::store::{OutboxStore, StoreTransaction};

const LOCK_PREFIX: &str = "outbox-";

/// Lock resource guarding one causality key. Entries without a key share
/// the bare prefix.
pub fn lock_name(causality_key: Option<&str>) -> String {
    format!("{LOCK_PREFIX}{}", causality_key.unwrap_or_default())
}

/// Processes entries grouped by causality key, one key at a time.
///
/// Each key is handled under its own distributed lock, so entries sharing a
/// key are dispatched in creation order by at most one worker. A key whose
/// lock is held elsewhere is skipped until the next call.
pub struct CausalityOrderedProcessor<S, L> {
    store: S,
    lock: L,
    registry: DispatchRegistry,
    config: Arc<OutboxConfig>,
}

impl<S: OutboxStore, L: LockClient> CausalityOrderedProcessor<S, L> {
    pub fn new(store: S, lock: L, registry: DispatchRegistry, config: Arc<OutboxConfig>) -> Self {
        Self {
            store,
            lock,
            registry,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn process_key(
        &self,
        causality_key: Option<&str>,
        observer: &mut dyn FnMut(&OutboxEntry, &EntryOutcome),
    ) -> Result<Vec<OutboxEntry>, ProcessorError> {
        let mut tx = self.store.begin()?;
        let mut entries =
            tx.fetch_processable_for_causality_key(self.config.batch_size, causality_key)?;
        process_entries(&mut tx, &mut entries, &self.registry, &self.config, observer)?;
        tx.commit()?;
        Ok(entries)
    }
}

impl<S: OutboxStore, L: LockClient> BatchProcessor for CausalityOrderedProcessor<S, L> {
    fn call(
        &self,
        observer: &mut dyn FnMut(&OutboxEntry, &EntryOutcome),
    ) -> Result<Vec<OutboxEntry>, ProcessorError> {
        let _span =
            tracing::info_span!("outbox_entries_processor", strategy = "causality_ordered")
                .entered();

        if !self.store.any_processable()? {
            return Ok(Vec::new());
        }

        let keys = self
            .store
            .unprocessed_causality_keys(self.config.causality_key_limit)?;

        let mut attempted = Vec::new();
        for key in keys {
            let resource = lock_name(key.as_deref());
            let result = try_with_lock(&self.lock, &resource, self.config.lock_ttl, || {
                self.process_key(key.as_deref(), &mut *observer)
            })?;
            if let Some(entries) = result {
                attempted.extend(entries);
            }
        }
        Ok(attempted)
    }

    fn reconnect(&self) -> Result<(), ProcessorError> {
        Ok(self.store.reconnect()?)
    }
}
