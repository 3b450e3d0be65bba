use std::error::Error;
use std::fmt;
use std::str::FromStr;

use super::MonitorError;
use crate::entry::OutboxEntry;

/// The closed set of events a run loop publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Started,
    Stopped,
    ShuttingDown,
    RecordProcessingFailed,
    RecordProcessed,
    Error,
    Heartbeat,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Started,
        EventKind::Stopped,
        EventKind::ShuttingDown,
        EventKind::RecordProcessingFailed,
        EventKind::RecordProcessed,
        EventKind::Error,
        EventKind::Heartbeat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Started => "started",
            EventKind::Stopped => "stopped",
            EventKind::ShuttingDown => "shutting_down",
            EventKind::RecordProcessingFailed => "record_processing_failed",
            EventKind::RecordProcessed => "record_processed",
            EventKind::Error => "error",
            EventKind::Heartbeat => "heartbeat",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = MonitorError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| MonitorError::UnknownEvent {
                event: name.to_string(),
                available: EventKind::ALL
                    .iter()
                    .map(|kind| kind.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Payload handed to listeners.
#[derive(Debug, Clone)]
pub struct Notification<'a> {
    pub kind: EventKind,
    pub entry: Option<&'a OutboxEntry>,
    pub error: Option<&'a (dyn Error + 'static)>,
    pub error_message: Option<String>,
}

impl<'a> Notification<'a> {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            entry: None,
            error: None,
            error_message: None,
        }
    }

    pub fn with_entry(mut self, entry: &'a OutboxEntry) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Attach an error; its display text becomes the error message.
    pub fn with_error(mut self, error: &'a (dyn Error + 'static)) -> Self {
        self.error_message = Some(error.to_string());
        self.error = Some(error);
        self
    }
}
