use std::sync::{Arc, Mutex};
use std::time::Duration;

use tasklane::engine::TaskObserver;

/// A lifecycle event as seen by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    Created { id: String, name: String },
    Started { id: String, name: String },
    Completed { id: String, name: String, duration: Duration },
    Failed { id: String, name: String, error: String },
}

impl ObservedEvent {
    pub fn id(&self) -> &str {
        match self {
            ObservedEvent::Created { id, .. }
            | ObservedEvent::Started { id, .. }
            | ObservedEvent::Completed { id, .. }
            | ObservedEvent::Failed { id, .. } => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ObservedEvent::Created { .. } => "created",
            ObservedEvent::Started { .. } => "started",
            ObservedEvent::Completed { .. } => "completed",
            ObservedEvent::Failed { .. } => "failed",
        }
    }
}

/// Observer that records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Event kinds for one entry, in delivery order.
    pub fn kinds_for(&self, id: &str) -> Vec<&'static str> {
        self.events()
            .iter()
            .filter(|e| e.id() == id)
            .map(ObservedEvent::kind)
            .collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events().iter().filter(|e| e.kind() == kind).count()
    }

    /// Error messages reported via `on_failed`, in order.
    pub fn failures(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::Failed { id, error, .. } => Some((id, error)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ObservedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl TaskObserver for RecordingObserver {
    fn on_created(&self, id: &str, name: &str) {
        self.push(ObservedEvent::Created {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    fn on_started(&self, id: &str, name: &str) {
        self.push(ObservedEvent::Started {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    fn on_completed(&self, id: &str, name: &str, duration: Duration) {
        self.push(ObservedEvent::Completed {
            id: id.to_string(),
            name: name.to_string(),
            duration,
        });
    }

    fn on_failed(&self, id: &str, name: &str, error: &str) {
        self.push(ObservedEvent::Failed {
            id: id.to_string(),
            name: name.to_string(),
            error: error.to_string(),
        });
    }
}

/// Observer that panics on every callback.
#[derive(Debug, Default)]
pub struct PanickingObserver;

impl TaskObserver for PanickingObserver {
    fn on_created(&self, _id: &str, _name: &str) {
        panic!("observer exploded on created");
    }

    fn on_started(&self, _id: &str, _name: &str) {
        panic!("observer exploded on started");
    }

    fn on_completed(&self, _id: &str, _name: &str, _duration: Duration) {
        panic!("observer exploded on completed");
    }

    fn on_failed(&self, _id: &str, _name: &str, _error: &str) {
        panic!("observer exploded on failed");
    }
}
