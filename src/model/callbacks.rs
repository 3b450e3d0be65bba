use std::fmt;
use std::sync::Arc;

use super::DomainObject;
use crate::dispatch::DispatchError;
use crate::entry::EventType;

type Callback = Arc<dyn Fn(&DomainObject) -> Result<(), DispatchError> + Send + Sync>;
type Predicate = Arc<dyn Fn(&DomainObject) -> bool + Send + Sync>;

#[derive(Clone)]
enum Condition {
    Always,
    If(Predicate),
    Unless(Predicate),
}

/// A callback that runs when an outbox entry for its domain object is
/// dispatched, rather than in-process after the write commits.
#[derive(Clone)]
pub struct ReliableCallback {
    on: Vec<EventType>,
    condition: Condition,
    callback: Callback,
}

impl ReliableCallback {
    pub fn new<F>(on: &[EventType], callback: F) -> Self
    where
        F: Fn(&DomainObject) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        Self {
            on: on.to_vec(),
            condition: Condition::Always,
            callback: Arc::new(callback),
        }
    }

    /// Run only when `predicate` holds for the object.
    pub fn only_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&DomainObject) -> bool + Send + Sync + 'static,
    {
        self.condition = Condition::If(Arc::new(predicate));
        self
    }

    /// Skip when `predicate` holds for the object.
    pub fn unless<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&DomainObject) -> bool + Send + Sync + 'static,
    {
        self.condition = Condition::Unless(Arc::new(predicate));
        self
    }

    pub fn for_event(&self, event_type: EventType) -> bool {
        self.on.contains(&event_type)
    }

    /// Invoke the callback if its guard allows it.
    pub fn call(&self, object: &DomainObject) -> Result<(), DispatchError> {
        let execute = match &self.condition {
            Condition::Always => true,
            Condition::If(predicate) => predicate(object),
            Condition::Unless(predicate) => !predicate(object),
        };
        if execute {
            (self.callback)(object)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for ReliableCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReliableCallback")
            .field("on", &self.on)
            .finish_non_exhaustive()
    }
}

/// Ordered registry of reliable callbacks for one domain class.
#[derive(Clone, Debug, Default)]
pub struct ReliableCallbacks {
    callbacks: Vec<ReliableCallback>,
}

impl ReliableCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callback: ReliableCallback) -> &mut Self {
        self.callbacks.push(callback);
        self
    }

    /// Runs on create, update and destroy.
    pub fn after_commit<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&DomainObject) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.register(ReliableCallback::new(&EventType::ALL, callback))
    }

    pub fn after_create_commit<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&DomainObject) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.register(ReliableCallback::new(&[EventType::Create], callback))
    }

    pub fn after_update_commit<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&DomainObject) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.register(ReliableCallback::new(&[EventType::Update], callback))
    }

    pub fn after_destroy_commit<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&DomainObject) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.register(ReliableCallback::new(&[EventType::Destroy], callback))
    }

    /// Runs on create and update.
    pub fn after_save_commit<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&DomainObject) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.register(ReliableCallback::new(
            &[EventType::Create, EventType::Update],
            callback,
        ))
    }

    pub fn for_event_type(&self, event_type: EventType) -> impl Iterator<Item = &ReliableCallback> {
        self.callbacks
            .iter()
            .filter(move |callback| callback.for_event(event_type))
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
