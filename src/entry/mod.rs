//! Outbox entry data model.
//!
//! - `OutboxEntry` - the durable queue record and its state transitions
//! - `NewOutboxEntry` - producer-side shape before the store assigns identity
//! - `EventType` - lifecycle event decoded from the entry's event name

#[allow(clippy::module_inception)]
mod entry;
mod event_type;
mod new_entry;

pub use entry::{EntryId, OutboxEntry, Payload};
pub use event_type::{EventType, EventTypeError};
pub use new_entry::NewOutboxEntry;
