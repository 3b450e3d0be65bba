use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("heartbeat storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("heartbeat could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("heartbeat storage lock poisoned")]
    Poisoned,
}
