use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EventType, EventTypeError};
use crate::backoff::ExponentialBackoff;
use crate::dispatch::DispatchError;

/// Opaque key/value payload carried to handlers (`changeset`, `arguments`).
pub type Payload = Map<String, Value>;

/// Store-assigned identity of an outbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    pub const fn new(value: u64) -> Self {
        EntryId(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntryId {
    fn from(value: u64) -> Self {
        EntryId(value)
    }
}

/// A durable queue record representing one domain-state change awaiting
/// dispatch.
///
/// Completion is a state transition (`processed_at` set), never a removal.
/// Failure bookkeeping (`failed_at`, `error_class`, `error_message`,
/// `attempts`, `retry_at`) gates when the entry becomes processable again.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: EntryId,
    pub resource_class: String,
    pub resource_id: String,
    pub event_name: String,
    pub context: String,
    #[serde(default)]
    pub changeset: Payload,
    #[serde(default)]
    pub arguments: Payload,
    pub causality_key: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub error_class: Option<String>,
    pub error_message: Option<String>,
    #[serde(default)]
    pub attempts: u32,
    pub retry_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The error that failed the latest attempt, kept for this process only.
    #[serde(skip)]
    error: Option<Arc<DispatchError>>,
}

impl OutboxEntry {
    /// Build a fresh, never-attempted entry. Stores call this on insert.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: EntryId,
        resource_class: impl Into<String>,
        resource_id: impl Into<String>,
        event_name: impl Into<String>,
        context: impl Into<String>,
        changeset: Payload,
        arguments: Payload,
        causality_key: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            resource_class: resource_class.into(),
            resource_id: resource_id.into(),
            event_name: event_name.into(),
            context: context.into(),
            changeset,
            arguments,
            causality_key,
            processed_at: None,
            failed_at: None,
            error_class: None,
            error_message: None,
            attempts: 0,
            retry_at: None,
            created_at,
            updated_at: created_at,
            error: None,
        }
    }

    /// `processed_at IS NULL AND (retry_at IS NULL OR retry_at <= now)`.
    pub fn is_processable_at(&self, now: DateTime<Utc>) -> bool {
        self.processed_at.is_none() && self.retry_at.map_or(true, |retry_at| retry_at <= now)
    }

    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.failed_at.is_some()
    }

    pub fn event_type(&self) -> Result<EventType, EventTypeError> {
        EventType::from_event_name(&self.event_name)
    }

    /// Record a failed dispatch attempt.
    ///
    /// `attempts` is incremented first and `retry_at` is computed from the
    /// incremented value.
    pub fn handle_error(
        &mut self,
        error: Arc<DispatchError>,
        now: DateTime<Utc>,
        backoff_multiplier: u64,
    ) {
        self.error_class = Some(error.class().to_string());
        self.error_message = Some(error.to_string());
        self.failed_at = Some(now);
        self.attempts = self.attempts.saturating_add(1);

        let delay = ExponentialBackoff::backoff_for(backoff_multiplier, self.attempts);
        let delay = i64::try_from(delay)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        self.retry_at = Some(now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC));
        self.updated_at = now;
        self.error = Some(error);
    }

    /// Terminal transition: set `processed_at` and clear every failure field.
    pub fn mark_processed(&mut self, now: DateTime<Utc>) {
        self.processed_at = Some(now);
        self.failed_at = None;
        self.error_class = None;
        self.error_message = None;
        self.retry_at = None;
        self.updated_at = now;
        self.error = None;
    }

    /// The error behind the latest failure.
    ///
    /// Within the process that recorded the failure this is the handler's own error value;
    /// for entries loaded back from storage it is rebuilt from the persisted
    /// class and message.
    pub fn error(&self) -> Option<Arc<DispatchError>> {
        if let Some(error) = &self.error {
            return Some(Arc::clone(error));
        }
        let class = self.error_class.as_ref()?;
        Some(Arc::new(DispatchError::Failed {
            class: class.clone(),
            message: self.error_message.clone().unwrap_or_default(),
            source: None,
        }))
    }

    /// Time from creation to delivery, for processed entries.
    pub fn processing_latency(&self) -> Option<TimeDelta> {
        self.processed_at.map(|processed_at| processed_at - self.created_at)
    }
}
