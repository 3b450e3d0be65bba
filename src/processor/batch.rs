use std::sync::Arc;

use super::ProcessorError;
use crate::config::OutboxConfig;
use crate::dispatch::{DispatchError, DispatchRegistry};
use crate::entry::{EntryId, OutboxEntry};
use crate::store::StoreTransaction;

/// Result of one dispatch attempt.
pub type EntryOutcome = Result<(), Arc<DispatchError>>;

/// Fetches a batch of entries, dispatches each, and records completion.
pub trait BatchProcessor: Send + Sync {
    /// Run one batch. `observer` sees every attempted entry with its outcome.
    ///
    /// Returns the attempted entries in dispatch order. Successful ones come
    /// back marked processed, failed ones carry their failure bookkeeping.
    fn call(
        &self,
        observer: &mut dyn FnMut(&OutboxEntry, &EntryOutcome),
    ) -> Result<Vec<OutboxEntry>, ProcessorError>;

    /// Establish or repair the connection to the backing store.
    fn reconnect(&self) -> Result<(), ProcessorError>;

    /// [`call`](Self::call) without an observer.
    fn process(&self) -> Result<Vec<OutboxEntry>, ProcessorError> {
        self.call(&mut |_, _| {})
    }
}

/// Dispatch `entries` in order inside `tx`.
///
/// A failed entry gets its failure recorded and saved right away; every other
/// entry is marked processed at the end.
pub(crate) fn process_entries<T: StoreTransaction>(
    tx: &mut T,
    entries: &mut [OutboxEntry],
    registry: &DispatchRegistry,
    config: &OutboxConfig,
    observer: &mut dyn FnMut(&OutboxEntry, &EntryOutcome),
) -> Result<(), ProcessorError> {
    let mut processed: Vec<EntryId> = Vec::with_capacity(entries.len());

    for entry in entries.iter_mut() {
        let outcome = match registry.dispatch(entry) {
            Ok(()) => {
                processed.push(entry.id);
                Ok(())
            }
            Err(error) => {
                let error = Arc::new(error);
                entry.handle_error(
                    Arc::clone(&error),
                    config.clock.now(),
                    config.backoff_multiplier,
                );
                tx.save(entry)?;
                Err(error)
            }
        };
        observer(&*entry, &outcome);
    }

    tx.mark_processed(&processed)?;

    let now = config.clock.now();
    for entry in entries.iter_mut().filter(|entry| processed.contains(&entry.id)) {
        entry.mark_processed(now);
    }
    Ok(())
}
