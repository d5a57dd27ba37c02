//! Event bus
//!
//! A process-wide publish/subscribe channel. Listeners run synchronously on
//! the emitting task, in subscription order.
//!
//! Framework events: `route:loaded`, `route:error`, `server:ready`,
//! `request:not_found`.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<HashMap<String, Vec<Listener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, event: impl Into<String>, listener: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        if let Ok(mut listeners) = self.listeners.write() {
            listeners
                .entry(event.into())
                .or_default()
                .push(Arc::new(listener));
        }
    }

    /// Deliver `data` to every listener of `event`; returns how many ran
    pub fn emit(&self, event: &str, data: &Value) -> usize {
        // snapshot so listeners may subscribe or emit re-entrantly
        let snapshot: Vec<Listener> = match self.listeners.read() {
            Ok(listeners) => listeners.get(event).cloned().unwrap_or_default(),
            Err(_) => return 0,
        };
        for listener in &snapshot {
            listener(data);
        }
        snapshot.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .read()
            .map(|l| l.get(event).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}
