//! Event bus for save/restore lifecycle notifications.
//!
//! A small namespaced publish-subscribe surface. Event names are stable —
//! they are the observable contract for hosts and user scripts. Emission
//! is synchronous and fire-and-forget; listeners cannot cancel an
//! in-flight operation, and a panicking listener is contained at the
//! emission site so it cannot break a save.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Stable event names published by the core.
pub mod topics {
    pub const PERIODIC_SAVE_START: &str = "resurrect.state_manager.periodic_save.start";
    pub const PERIODIC_SAVE_FINISHED: &str = "resurrect.state_manager.periodic_save.finished";
    pub const LOAD_STATE_START: &str = "resurrect.state_manager.load_state.start";
    pub const LOAD_STATE_FINISHED: &str = "resurrect.state_manager.load_state.finished";
    pub const DELETE_STATE_START: &str = "resurrect.state_manager.delete_state.start";
    pub const DELETE_STATE_FINISHED: &str = "resurrect.state_manager.delete_state.finished";
    pub const WRITE_STATE_START: &str = "resurrect.file_io.write_state.start";
    pub const WRITE_STATE_FINISHED: &str = "resurrect.file_io.write_state.finished";
    pub const RESTORE_WORKSPACE_START: &str = "resurrect.workspace_state.restore_workspace.start";
    pub const RESTORE_WORKSPACE_FINISHED: &str =
        "resurrect.workspace_state.restore_workspace.finished";
    pub const RESTORE_WINDOW_START: &str = "resurrect.window_state.restore_window.start";
    pub const RESTORE_WINDOW_FINISHED: &str = "resurrect.window_state.restore_window.finished";
    pub const RESTORE_TAB_START: &str = "resurrect.tab_state.restore_tab.start";
    pub const RESTORE_TAB_FINISHED: &str = "resurrect.tab_state.restore_tab.finished";
    /// Any non-fatal failure, carrying a human-readable message.
    pub const ERROR: &str = "resurrect.error";
}

/// A published event: the topic name plus an optional message (used by
/// [`topics::ERROR`]).
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub message: Option<String>,
}

impl Event {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: Some(message.into()),
        }
    }
}

type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Synchronous publish-subscribe registry keyed by event name.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for a single event name.
    pub fn subscribe(&self, name: impl Into<String>, listener: impl Fn(&Event) + Send + Sync + 'static) {
        let mut map = self.listeners.lock().expect("event bus lock");
        map.entry(name.into()).or_default().push(Arc::new(listener));
    }

    /// Emit a bare event by name.
    pub fn emit(&self, name: &str) {
        self.emit_event(Event::named(name));
    }

    /// Emit [`topics::ERROR`] with a human-readable message.
    pub fn emit_error(&self, message: impl Into<String>) {
        self.emit_event(Event::with_message(topics::ERROR, message));
    }

    /// Emit an event to all listeners registered for its name.
    ///
    /// Listeners run synchronously, in subscription order. A panic in one
    /// listener is caught and logged; remaining listeners still run.
    pub fn emit_event(&self, event: Event) {
        let listeners = {
            let map = self.listeners.lock().expect("event bus lock");
            map.get(&event.name).cloned().unwrap_or_default()
        };

        for listener in listeners {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener(&event)));
            if outcome.is_err() {
                warn!(event = %event.name, "event listener panicked; continuing");
            }
        }
    }

    /// Number of listeners registered for an event name.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        let map = self.listeners.lock().expect("event bus lock");
        map.get(name).map_or(0, Vec::len)
    }
}
