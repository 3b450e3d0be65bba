use serde::{Deserialize, Serialize};

use crate::entry::Payload;

/// A resolved domain object as seen by reliable callbacks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainObject {
    pub resource_class: String,
    pub resource_id: String,
    #[serde(default)]
    pub attributes: Payload,
    /// The changeset recorded with the outbox entry, replayed at dispatch.
    #[serde(default)]
    pub previous_changes: Payload,
    /// False for stand-ins built when the object no longer exists.
    #[serde(default = "persisted_default")]
    pub persisted: bool,
}

fn persisted_default() -> bool {
    true
}

impl DomainObject {
    pub fn new(resource_class: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_class: resource_class.into(),
            resource_id: resource_id.into(),
            attributes: Payload::new(),
            previous_changes: Payload::new(),
            persisted: true,
        }
    }

    /// Identity-only stand-in for an object that has been destroyed.
    pub fn identity_only(
        resource_class: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            persisted: false,
            ..Self::new(resource_class, resource_id)
        }
    }

    pub fn with_attributes(mut self, attributes: Payload) -> Self {
        self.attributes = attributes;
        self
    }

    /// Singular snake_case name derived from the class: `OrderItem` becomes
    /// `order_item`, `billing::Invoice` becomes `invoice`.
    pub fn singular_name(&self) -> String {
        let base = self
            .resource_class
            .rsplit("::")
            .next()
            .unwrap_or(&self.resource_class);

        let mut name = String::with_capacity(base.len() + 4);
        for (i, ch) in base.chars().enumerate() {
            if ch.is_uppercase() {
                if i > 0 && !name.ends_with('_') {
                    name.push('_');
                }
                name.extend(ch.to_lowercase());
            } else {
                name.push(ch);
            }
        }
        name
    }
}
