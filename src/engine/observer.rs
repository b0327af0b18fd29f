// src/engine/observer.rs

//! Lifecycle observers and the registry that fans events out to them.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::error;

use crate::engine::panic_message;

/// Listener for entry lifecycle events.
///
/// Callbacks run synchronously on the submitting thread (`on_created`) or
/// on the dispatch loop (everything else), so they should be quick. A
/// panicking observer is caught and logged; it never affects scheduling.
///
/// `on_created` is delivered before the entry is queued, so it always
/// precedes that entry's `on_started`.
pub trait TaskObserver: Send + Sync {
    fn on_created(&self, _id: &str, _name: &str) {}

    fn on_started(&self, _id: &str, _name: &str) {}

    fn on_completed(&self, _id: &str, _name: &str, _duration: Duration) {}

    fn on_failed(&self, _id: &str, _name: &str, _error: &str) {}
}

/// Set of registered observers.
///
/// Identity is the `Arc` allocation: registering the same `Arc` twice is a
/// no-op, so every event is delivered at most once per observer.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<Arc<dyn TaskObserver>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the observer was already registered.
    pub fn add(&self, observer: Arc<dyn TaskObserver>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        if observers.iter().any(|o| same_observer(o, &observer)) {
            return false;
        }
        observers.push(observer);
        true
    }

    /// Returns false if the observer was not registered.
    pub fn remove(&self, observer: &Arc<dyn TaskObserver>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|o| !same_observer(o, observer));
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify_created(&self, id: &str, name: &str) {
        self.fan_out("created", |o| o.on_created(id, name));
    }

    pub fn notify_started(&self, id: &str, name: &str) {
        self.fan_out("started", |o| o.on_started(id, name));
    }

    pub fn notify_completed(&self, id: &str, name: &str, duration: Duration) {
        self.fan_out("completed", |o| o.on_completed(id, name, duration));
    }

    pub fn notify_failed(&self, id: &str, name: &str, error: &str) {
        self.fan_out("failed", |o| o.on_failed(id, name, error));
    }

    // Observers are called on a snapshot, outside the lock, so a callback
    // may itself add or remove observers.
    fn fan_out(&self, event: &str, f: impl Fn(&dyn TaskObserver)) {
        let snapshot: Vec<Arc<dyn TaskObserver>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for observer in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| f(observer.as_ref()))) {
                error!(
                    event,
                    error = %panic_message(payload.as_ref()),
                    "observer notification failed"
                );
            }
        }
    }
}

fn same_observer(a: &Arc<dyn TaskObserver>, b: &Arc<dyn TaskObserver>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Prints lifecycle events to stdout; the textual front end's status view.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver;

impl TaskObserver for ConsoleObserver {
    fn on_created(&self, id: &str, name: &str) {
        println!("[tasklane] created   {name} ({id})");
    }

    fn on_started(&self, id: &str, name: &str) {
        println!("[tasklane] started   {name} ({id})");
    }

    fn on_completed(&self, id: &str, name: &str, duration: Duration) {
        println!(
            "[tasklane] completed {name} ({id}) in {:.3}s",
            duration.as_secs_f64()
        );
    }

    fn on_failed(&self, id: &str, name: &str, error: &str) {
        println!("[tasklane] failed    {name} ({id}): {error}");
    }
}
