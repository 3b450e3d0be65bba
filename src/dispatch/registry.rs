use std::sync::Arc;

use super::{DispatchError, EntryHandler};
use crate::entry::OutboxEntry;

/// Ordered collection of handlers.
///
/// Dispatch runs every applicable handler in registration order and stops at
/// the first failure; the remaining handlers run again when the entry is
/// retried.
#[derive(Clone, Default)]
pub struct DispatchRegistry {
    handlers: Vec<Arc<dyn EntryHandler>>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler<H: EntryHandler + 'static>(mut self, handler: H) -> Self {
        self.register(handler);
        self
    }

    pub fn register<H: EntryHandler + 'static>(&mut self, handler: H) {
        self.handlers.push(Arc::new(handler));
    }

    pub fn register_shared(&mut self, handler: Arc<dyn EntryHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn dispatch(&self, entry: &OutboxEntry) -> Result<(), DispatchError> {
        let applicable: Vec<&Arc<dyn EntryHandler>> = self
            .handlers
            .iter()
            .filter(|handler| handler.applies(entry))
            .collect();

        if applicable.is_empty() {
            return Err(DispatchError::NoHandlerFound {
                id: entry.id,
                context: entry.context.clone(),
            });
        }

        for handler in applicable {
            handler.handle(entry)?;
        }
        Ok(())
    }
}
