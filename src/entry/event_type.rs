use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle event a domain object went through.
///
/// Encoded in an entry's `event_name` as a suffix, e.g. `user_created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Create,
    Update,
    Destroy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventTypeError {
    #[error("unknown event type: {0}")]
    UnknownEventName(String),
    #[error("unknown event type: {0}")]
    UnknownEventType(String),
}

impl EventType {
    pub const ALL: [EventType; 3] = [EventType::Create, EventType::Update, EventType::Destroy];

    /// Decode the event type from an event name by its suffix.
    ///
    /// Suffixes are tried in `created`, `updated`, `destroyed` order.
    pub fn from_event_name(event_name: &str) -> Result<Self, EventTypeError> {
        Self::ALL
            .into_iter()
            .find(|event_type| event_name.ends_with(event_type.event_name_suffix()))
            .ok_or_else(|| EventTypeError::UnknownEventName(event_name.to_string()))
    }

    pub fn event_name_suffix(self) -> &'static str {
        match self {
            EventType::Create => "created",
            EventType::Update => "updated",
            EventType::Destroy => "destroyed",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Create => "create",
            EventType::Update => "update",
            EventType::Destroy => "destroy",
        }
    }

    pub fn is_destroy(self) -> bool {
        self == EventType::Destroy
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(EventType::Create),
            "update" => Ok(EventType::Update),
            "destroy" => Ok(EventType::Destroy),
            other => Err(EventTypeError::UnknownEventType(other.to_string())),
        }
    }
}
