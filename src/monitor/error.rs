use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("unknown event: {event}, the available events are: {available}")]
    UnknownEvent { event: String, available: String },
}
