//! Producer-side model integration.
//!
//! A domain write appends an entry built by `OutboxEntryFactory` in the same
//! transaction. At dispatch, `ModelHandler` resolves the object through a
//! `ModelResolver` and runs its `ReliableCallbacks`.
//!
//! ## Example
//!
//! ```ignore
//! let mut callbacks = ReliableCallbacks::new();
//! callbacks.after_create_commit(|user| send_welcome_email(user));
//!
//! let handler = ModelHandler::new(resolver, &config).with_callbacks("User", callbacks);
//! let registry = DispatchRegistry::new().with_handler(handler);
//! ```

mod callbacks;
mod domain_object;
mod factory;
mod handler;
mod in_memory;
mod resolver;

pub use callbacks::{ReliableCallback, ReliableCallbacks};
pub use domain_object::DomainObject;
pub use factory::OutboxEntryFactory;
pub use handler::ModelHandler;
pub use in_memory::InMemoryModelResolver;
pub use resolver::ModelResolver;

/// Dispatch context of entries produced by [`OutboxEntryFactory`].
pub const MODEL_CONTEXT: &str = "model";
