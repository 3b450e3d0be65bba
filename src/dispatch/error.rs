use std::error::Error as StdError;

use thiserror::Error;

use crate::entry::{EntryId, EventTypeError};

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Why dispatching one entry failed.
///
/// Every variant is entry-level and recoverable: the batch processor converts
/// it into failure bookkeeping on the entry and moves on.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no handler was found for entry with ID: {id}, context: {context}")]
    NoHandlerFound { id: EntryId, context: String },

    #[error("could not find model for outbox entry: {id} ({resource_class} {resource_id})")]
    ModelNotFound {
        id: EntryId,
        resource_class: String,
        resource_id: String,
    },

    #[error(transparent)]
    UnknownEventType(#[from] EventTypeError),

    /// A handler-raised failure. `class` is what gets persisted as the
    /// entry's `error_class`.
    #[error("{message}")]
    Failed {
        class: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl DispatchError {
    /// Wrap any handler error, using its type name as the class.
    pub fn failed<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        DispatchError::Failed {
            class: short_type_name::<E>().to_string(),
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    /// A handler failure with an explicit class and message.
    pub fn failed_with(class: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::Failed {
            class: class.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Stable name persisted as the entry's `error_class`.
    pub fn class(&self) -> &str {
        match self {
            DispatchError::NoHandlerFound { .. } => "NoHandlerFound",
            DispatchError::ModelNotFound { .. } => "ModelNotFound",
            DispatchError::UnknownEventType(_) => "UnknownEventType",
            DispatchError::Failed { class, .. } => class,
        }
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}
