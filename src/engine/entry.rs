// src/engine/entry.rs

//! The engine's scheduling record and its read-only snapshot.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::engine::strategy::{ExecutionStrategy, OnceStrategy, PeriodicStrategy};
use crate::engine::{EntryId, EntryStatus, Task};

/// Binds a [`Task`] to its timing, status and strategy.
///
/// Entries are owned by [`SchedulerCore`](crate::engine::SchedulerCore);
/// the dispatch queue only refers to them by id.
pub struct ScheduledEntry {
    pub id: EntryId,
    pub task: Arc<dyn Task>,
    /// Absolute time at or after which the entry may be dispatched.
    pub due_time: Instant,
    /// Set only for periodic entries; always non-zero.
    pub interval: Option<Duration>,
    pub strategy: Arc<dyn ExecutionStrategy>,
    pub status: EntryStatus,
    /// Number of times the body has been started. Never reset.
    pub execution_count: u64,
    pub error_message: Option<String>,
    pub last_duration: Option<Duration>,
    /// Set by `cancel` while the entry is running; the entry is dropped
    /// instead of requeued once the run finishes.
    pub cancel_requested: bool,
}

impl ScheduledEntry {
    /// Build a one-shot entry due at `due_time`.
    pub fn once(id: EntryId, task: Arc<dyn Task>, due_time: Instant) -> Self {
        Self::new(id, task, due_time, None, Arc::new(OnceStrategy))
    }

    /// Build a periodic entry whose first run is at `due_time`.
    ///
    /// Callers validate `interval > 0` before getting here.
    pub fn periodic(
        id: EntryId,
        task: Arc<dyn Task>,
        due_time: Instant,
        interval: Duration,
    ) -> Self {
        Self::new(
            id,
            task,
            due_time,
            Some(interval),
            Arc::new(PeriodicStrategy::new(interval)),
        )
    }

    fn new(
        id: EntryId,
        task: Arc<dyn Task>,
        due_time: Instant,
        interval: Option<Duration>,
        strategy: Arc<dyn ExecutionStrategy>,
    ) -> Self {
        Self {
            id,
            task,
            due_time,
            interval,
            strategy,
            status: EntryStatus::Pending,
            execution_count: 0,
            error_message: None,
            last_duration: None,
            cancel_requested: false,
        }
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    pub fn is_periodic(&self) -> bool {
        self.interval.is_some()
    }

    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            id: self.id.clone(),
            name: self.name().to_string(),
            status: self.status,
            due_time: self.due_time,
            interval: self.interval,
            execution_count: self.execution_count,
            error_message: self.error_message.clone(),
            last_duration: self.last_duration,
        }
    }
}

impl fmt::Debug for ScheduledEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledEntry")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("due_time", &self.due_time)
            .field("interval", &self.interval)
            .field("strategy", &self.strategy)
            .field("status", &self.status)
            .field("execution_count", &self.execution_count)
            .field("error_message", &self.error_message)
            .finish_non_exhaustive()
    }
}

/// Public, read-only view of an entry.
///
/// Exposed for front ends and tests without handing out the task itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub id: EntryId,
    pub name: String,
    pub status: EntryStatus,
    pub due_time: Instant,
    pub interval: Option<Duration>,
    pub execution_count: u64,
    pub error_message: Option<String>,
    pub last_duration: Option<Duration>,
}

impl EntrySnapshot {
    pub fn is_periodic(&self) -> bool {
        self.interval.is_some()
    }
}
