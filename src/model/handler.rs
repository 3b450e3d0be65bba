use std::collections::HashMap;

use super::{DomainObject, ModelResolver, ReliableCallbacks, MODEL_CONTEXT};
use crate::config::OutboxConfig;
use crate::dispatch::{DispatchError, EntryHandler};
use crate::entry::OutboxEntry;

/// Built-in handler for entries produced by [`OutboxEntryFactory`](super::OutboxEntryFactory).
///
/// Resolves the domain object, replays the recorded changeset as its
/// `previous_changes`, and runs the reliable callbacks registered for its
/// class and the entry's event type.
pub struct ModelHandler<R> {
    resolver: R,
    callbacks: HashMap<String, ReliableCallbacks>,
    raise_not_found: bool,
}

impl<R: ModelResolver> ModelHandler<R> {
    pub fn new(resolver: R, config: &OutboxConfig) -> Self {
        Self {
            resolver,
            callbacks: HashMap::new(),
            raise_not_found: config.raise_not_found_model_error,
        }
    }

    pub fn with_callbacks(
        mut self,
        resource_class: impl Into<String>,
        callbacks: ReliableCallbacks,
    ) -> Self {
        self.callbacks.insert(resource_class.into(), callbacks);
        self
    }

    fn resolve(
        &self,
        entry: &OutboxEntry,
        destroyed: bool,
    ) -> Result<Option<DomainObject>, DispatchError> {
        if let Some(object) = self.resolver.find(&entry.resource_class, &entry.resource_id)? {
            return Ok(Some(object));
        }
        if destroyed {
            return Ok(Some(DomainObject::identity_only(
                entry.resource_class.clone(),
                entry.resource_id.clone(),
            )));
        }
        if self.raise_not_found {
            return Err(DispatchError::ModelNotFound {
                id: entry.id,
                resource_class: entry.resource_class.clone(),
                resource_id: entry.resource_id.clone(),
            });
        }
        tracing::debug!(
            entry_id = %entry.id,
            resource_class = %entry.resource_class,
            "model not found, skipping"
        );
        Ok(None)
    }
}

impl<R: ModelResolver> EntryHandler for ModelHandler<R> {
    fn applies(&self, entry: &OutboxEntry) -> bool {
        entry.context == MODEL_CONTEXT
    }

    fn handle(&self, entry: &OutboxEntry) -> Result<(), DispatchError> {
        let event_type = entry.event_type()?;
        let Some(mut object) = self.resolve(entry, event_type.is_destroy())? else {
            return Ok(());
        };
        object.previous_changes = entry.changeset.clone();

        if let Some(callbacks) = self.callbacks.get(&entry.resource_class) {
            for callback in callbacks.for_event_type(event_type) {
                callback.call(&object)?;
            }
        }
        Ok(())
    }
}
