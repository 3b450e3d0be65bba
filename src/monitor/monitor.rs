use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{EventKind, MonitorError, Notification};

type Listener = Arc<dyn Fn(&Notification<'_>) + Send + Sync>;

/// Synchronous event bus for run-loop instrumentation.
///
/// Listeners run on the publishing thread, in subscription order. Clones
/// share listeners.
#[derive(Clone, Default)]
pub struct Monitor {
    listeners: Arc<RwLock<HashMap<EventKind, Vec<Listener>>>>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &'static [EventKind] {
        &EventKind::ALL
    }

    pub fn subscribe<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&Notification<'_>) + Send + Sync + 'static,
    {
        let mut listeners = match self.listeners.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        listeners.entry(kind).or_default().push(Arc::new(listener));
    }

    /// Subscribe by event name, rejecting names outside [`EventKind`].
    pub fn subscribe_named<F>(&self, name: &str, listener: F) -> Result<(), MonitorError>
    where
        F: Fn(&Notification<'_>) + Send + Sync + 'static,
    {
        let kind = name.parse()?;
        self.subscribe(kind, listener);
        Ok(())
    }

    /// Listeners are invoked after the registry lock is released, so a
    /// listener may subscribe on the same monitor.
    pub fn instrument(&self, notification: &Notification<'_>) {
        let listeners: Vec<Listener> = {
            let listeners = match self.listeners.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            listeners
                .get(&notification.kind)
                .map(|listeners| listeners.to_vec())
                .unwrap_or_default()
        };
        for listener in &listeners {
            listener(notification);
        }
    }

    pub fn emit(&self, kind: EventKind) {
        self.instrument(&Notification::new(kind));
    }
}
