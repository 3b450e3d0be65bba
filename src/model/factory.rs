use std::fmt;
use std::sync::Arc;

use super::{DomainObject, MODEL_CONTEXT};
use crate::entry::{EventType, NewOutboxEntry, Payload};

type CausalityKeyResolver = Arc<dyn Fn(&DomainObject) -> Option<String> + Send + Sync>;

/// Builds the outbox entry a producer appends inside its write transaction.
#[derive(Clone, Default)]
pub struct OutboxEntryFactory {
    causality_key_resolver: Option<CausalityKeyResolver>,
}

impl OutboxEntryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_causality_key_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&DomainObject) -> Option<String> + Send + Sync + 'static,
    {
        self.causality_key_resolver = Some(Arc::new(resolver));
        self
    }

    /// `changeset` is the prior-to-new value diff of the write.
    pub fn build(
        &self,
        object: &DomainObject,
        event_type: EventType,
        changeset: Payload,
    ) -> NewOutboxEntry {
        let event_name = format!("{}_{}", object.singular_name(), event_type.event_name_suffix());
        let entry = NewOutboxEntry::new(
            object.resource_class.clone(),
            object.resource_id.clone(),
            event_name,
            MODEL_CONTEXT,
        )
        .with_changeset(changeset);

        match self
            .causality_key_resolver
            .as_ref()
            .and_then(|resolve| resolve(object))
        {
            Some(key) => entry.with_causality_key(key),
            None => entry,
        }
    }
}

impl fmt::Debug for OutboxEntryFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboxEntryFactory")
            .field("causality_key_resolver", &self.causality_key_resolver.is_some())
            .finish()
    }
}
