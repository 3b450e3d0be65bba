use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntryId, OutboxEntry, Payload};

/// An entry as written by the producer, before the store assigns identity
/// and timestamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewOutboxEntry {
    pub resource_class: String,
    pub resource_id: String,
    pub event_name: String,
    pub context: String,
    pub changeset: Payload,
    pub arguments: Payload,
    pub causality_key: Option<String>,
}

impl NewOutboxEntry {
    pub fn new(
        resource_class: impl Into<String>,
        resource_id: impl Into<String>,
        event_name: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            resource_class: resource_class.into(),
            resource_id: resource_id.into(),
            event_name: event_name.into(),
            context: context.into(),
            changeset: Payload::new(),
            arguments: Payload::new(),
            causality_key: None,
        }
    }

    pub fn with_changeset(mut self, changeset: Payload) -> Self {
        self.changeset = changeset;
        self
    }

    pub fn with_arguments(mut self, arguments: Payload) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_causality_key(mut self, key: impl Into<String>) -> Self {
        self.causality_key = Some(key.into());
        self
    }

    /// Materialize with store-assigned identity and creation time.
    pub fn into_entry(self, id: EntryId, created_at: DateTime<Utc>) -> OutboxEntry {
        OutboxEntry::new(
            id,
            self.resource_class,
            self.resource_id,
            self.event_name,
            self.context,
            self.changeset,
            self.arguments,
            self.causality_key,
            created_at,
        )
    }
}
