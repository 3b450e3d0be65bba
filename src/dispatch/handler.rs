use super::DispatchError;
use crate::entry::OutboxEntry;

/// A dispatch target for outbox entries.
///
/// `applies` selects entries (typically by `context`); `handle` delivers one.
/// Handlers must be idempotent: delivery is at-least-once and a failed entry
/// is retried from scratch, including handlers that already succeeded for it.
pub trait EntryHandler: Send + Sync {
    fn applies(&self, entry: &OutboxEntry) -> bool;

    fn handle(&self, entry: &OutboxEntry) -> Result<(), DispatchError>;
}

/// Handler built from two closures.
///
/// ```ignore
/// let handler = FnHandler::new(
///     |entry| entry.context == "billing",
///     |entry| billing.sync(entry).map_err(DispatchError::failed),
/// );
/// ```
pub struct FnHandler<A, H> {
    applies: A,
    handle: H,
}

impl<A, H> FnHandler<A, H>
where
    A: Fn(&OutboxEntry) -> bool + Send + Sync,
    H: Fn(&OutboxEntry) -> Result<(), DispatchError> + Send + Sync,
{
    pub fn new(applies: A, handle: H) -> Self {
        Self { applies, handle }
    }
}

impl<A, H> EntryHandler for FnHandler<A, H>
where
    A: Fn(&OutboxEntry) -> bool + Send + Sync,
    H: Fn(&OutboxEntry) -> Result<(), DispatchError> + Send + Sync,
{
    fn applies(&self, entry: &OutboxEntry) -> bool {
        (self.applies)(entry)
    }

    fn handle(&self, entry: &OutboxEntry) -> Result<(), DispatchError> {
        (self.handle)(entry)
    }
}

/// Handler selected by an exact `context` match.
pub struct ContextHandler<H> {
    context: String,
    handle: H,
}

impl<H> ContextHandler<H>
where
    H: Fn(&OutboxEntry) -> Result<(), DispatchError> + Send + Sync,
{
    pub fn new(context: impl Into<String>, handle: H) -> Self {
        Self {
            context: context.into(),
            handle,
        }
    }
}

impl<H> EntryHandler for ContextHandler<H>
where
    H: Fn(&OutboxEntry) -> Result<(), DispatchError> + Send + Sync,
{
    fn applies(&self, entry: &OutboxEntry) -> bool {
        entry.context == self.context
    }

    fn handle(&self, entry: &OutboxEntry) -> Result<(), DispatchError> {
        (self.handle)(entry)
    }
}
