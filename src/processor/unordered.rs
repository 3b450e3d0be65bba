use std::sync::Arc;

use super::batch::process_entries;
use super::{BatchProcessor, EntryOutcome, ProcessorError};
use crate::config::OutboxConfig;
use crate::dispatch::DispatchRegistry;
use crate::entry::OutboxEntry;
use crate::store::{OutboxStore, StoreTransaction};

/// Processes the oldest processable entries in one unit of work.
///
/// Concurrent workers receive disjoint batches through the store's row
/// acquisition, so batches proceed in parallel with no ordering between them.
pub struct UnorderedProcessor<S> {
    store: S,
    registry: DispatchRegistry,
    config: Arc<OutboxConfig>,
}

impl<S: OutboxStore> UnorderedProcessor<S> {
    pub fn new(store: S, registry: DispatchRegistry, config: Arc<OutboxConfig>) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: OutboxStore> BatchProcessor for UnorderedProcessor<S> {
    fn call(
        &self,
        observer: &mut dyn FnMut(&OutboxEntry, &EntryOutcome),
    ) -> Result<Vec<OutboxEntry>, ProcessorError> {
        let _span =
            tracing::info_span!("outbox_entries_processor", strategy = "unordered").entered();

        if !self.store.any_processable()? {
            return Ok(Vec::new());
        }

        let mut tx = self.store.begin()?;
        let mut entries = tx.fetch_processable(self.config.batch_size)?;
        process_entries(&mut tx, &mut entries, &self.registry, &self.config, observer)?;
        tx.commit()?;

        Ok(entries)
    }

    fn reconnect(&self) -> Result<(), ProcessorError> {
        Ok(self.store.reconnect()?)
    }
}
