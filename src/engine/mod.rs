// src/engine/mod.rs

//! Scheduling engine for tasklane.
//!
//! This module ties together:
//! - the [`Task`] capability that callers hand to the engine
//! - the per-entry bookkeeping ([`entry`]) and its Once / Periodic
//!   [`strategy`]
//! - the due-time ordered [`queue`]
//! - the observer fan-out ([`observer`])
//!
//! The pure, clock-injected state machine lives in [`core`]; the async
//! dispatch loop and the public [`Scheduler`] handle live in [`runtime`].

use std::any::Any;
use std::fmt;

/// Engine-assigned identifier of a scheduled entry (`TASK_000001`, ...).
pub type EntryId = String;

/// A unit of work the engine can run.
///
/// The engine only needs a name and an `execute` operation; how the task
/// was built and what state it closes over is up to its creator. Bodies
/// run on a blocking-capable thread, so plain synchronous code is fine.
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    fn execute(&self) -> anyhow::Result<()>;
}

/// Lifecycle status of a scheduled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// Waiting in the queue for its due time.
    Pending,
    /// Popped by the dispatch loop; the body is executing.
    Running,
    /// A one-shot entry finished successfully.
    Completed,
    /// The body returned an error or panicked. Never rescheduled.
    Failed,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryStatus::Pending => "PENDING",
            EntryStatus::Running => "RUNNING",
            EntryStatus::Completed => "COMPLETED",
            EntryStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Point-in-time counts of entries per status.
///
/// Always taken under the engine lock, so
/// `pending + running + completed + failed == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl Statistics {
    pub(crate) fn record(&mut self, status: EntryStatus) {
        self.total += 1;
        match status {
            EntryStatus::Pending => self.pending += 1,
            EntryStatus::Running => self.running += 1,
            EntryStatus::Completed => self.completed += 1,
            EntryStatus::Failed => self.failed += 1,
        }
    }
}

/// Best-effort extraction of a panic payload message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

pub mod core;
pub mod entry;
pub mod observer;
pub mod queue;
pub mod runtime;
pub mod strategy;

pub use self::core::{Poll, ReadyEntry, RunOutcome, SchedulerCore};
pub use entry::{EntrySnapshot, ScheduledEntry};
pub use observer::{ConsoleObserver, ObserverRegistry, TaskObserver};
pub use queue::{DispatchQueue, QueuedEntry};
pub use runtime::{Scheduler, SchedulerOptions};
pub use strategy::{AfterRun, ExecutionStrategy, OnceStrategy, PeriodicStrategy};
