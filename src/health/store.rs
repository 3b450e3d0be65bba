use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HealthError;

/// Key/value storage for worker heartbeats.
pub trait HeartbeatStore: Send + Sync {
    fn touch(&self, key: &str, at: DateTime<Utc>) -> Result<(), HealthError>;

    fn remove(&self, key: &str) -> Result<(), HealthError>;

    fn last_beat(&self, key: &str) -> Result<Option<DateTime<Utc>>, HealthError>;
}

/// Process-local heartbeats. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryHeartbeatStore {
    beats: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl InMemoryHeartbeatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeartbeatStore for InMemoryHeartbeatStore {
    fn touch(&self, key: &str, at: DateTime<Utc>) -> Result<(), HealthError> {
        let mut beats = self.beats.write().map_err(|_| HealthError::Poisoned)?;
        beats.insert(key.to_string(), at);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), HealthError> {
        let mut beats = self.beats.write().map_err(|_| HealthError::Poisoned)?;
        beats.remove(key);
        Ok(())
    }

    fn last_beat(&self, key: &str) -> Result<Option<DateTime<Utc>>, HealthError> {
        let beats = self.beats.read().map_err(|_| HealthError::Poisoned)?;
        Ok(beats.get(key).copied())
    }
}

#[derive(Serialize, Deserialize)]
struct Heartbeat {
    beat_at: DateTime<Utc>,
}

/// One JSON file per key under a directory, readable by a separate probe
/// process on the same host.
#[derive(Debug, Clone)]
pub struct FileHeartbeatStore {
    directory: PathBuf,
}

impl FileHeartbeatStore {
    pub const DEFAULT_DIRECTORY: &'static str = "/tmp";

    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path(&self, key: &str) -> PathBuf {
        self.directory.join(key)
    }
}

impl Default for FileHeartbeatStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIRECTORY)
    }
}

impl HeartbeatStore for FileHeartbeatStore {
    fn touch(&self, key: &str, at: DateTime<Utc>) -> Result<(), HealthError> {
        let bytes = serde_json::to_vec(&Heartbeat { beat_at: at })?;
        fs::write(self.path(key), bytes)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), HealthError> {
        match fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    fn last_beat(&self, key: &str) -> Result<Option<DateTime<Utc>>, HealthError> {
        let bytes = match fs::read(self.path(key)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let heartbeat: Heartbeat = serde_json::from_slice(&bytes)?;
        Ok(Some(heartbeat.beat_at))
    }
}
