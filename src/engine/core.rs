// src/engine/core.rs

//! Pure core scheduler state.
//!
//! [`SchedulerCore`] owns the entry map and the dispatch queue and
//! implements every status transition. It never sleeps, spawns, or reads
//! the clock: callers pass `now` explicitly. The async shell
//! ([`crate::engine::runtime`]) keeps it behind one mutex and drives it
//! from the dispatch loop, which makes the core deterministic to test.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::engine::entry::{EntrySnapshot, ScheduledEntry};
use crate::engine::queue::DispatchQueue;
use crate::engine::strategy::AfterRun;
use crate::engine::{EntryId, EntryStatus, Statistics, Task};

/// Result of asking the core for the next thing to do.
pub enum Poll {
    /// Nothing queued; wait for an insertion.
    Empty,
    /// The earliest entry is due at this instant.
    NotDue(Instant),
    /// An entry was popped and marked `Running`; execute it.
    Ready(ReadyEntry),
}

/// Everything the dispatch loop needs to run one popped entry.
pub struct ReadyEntry {
    pub id: EntryId,
    pub name: String,
    pub task: Arc<dyn Task>,
    pub execution_count: u64,
}

/// Outcome of a single execution of a task body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct SchedulerCore {
    /// Keyed by insertion sequence so iteration follows submission order.
    entries: BTreeMap<u64, ScheduledEntry>,
    index: HashMap<EntryId, u64>,
    next_seq: u64,
    queue: DispatchQueue,
}

impl SchedulerCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending entry and queue it at its due time.
    ///
    /// Re-inserting a known id replaces the old entry.
    pub fn insert(&mut self, entry: ScheduledEntry) {
        self.remove(&entry.id);
        let seq = self.next_seq;
        self.next_seq += 1;

        self.queue.insert(entry.id.clone(), entry.due_time);
        self.index.insert(entry.id.clone(), seq);
        self.entries.insert(seq, entry);
    }

    /// Pop the earliest entry if it is due and eligible.
    ///
    /// Stale slots (cancelled entries) are discarded on the way. An entry
    /// whose strategy declines to run is dropped from the queue; with the
    /// built-in strategies this only happens to a one-shot entry that has
    /// already executed.
    pub fn poll(&mut self, now: Instant) -> Poll {
        loop {
            let (live, due_time) = match self.queue.peek_earliest() {
                Some(head) => (self.is_live(&head.id, head.due_time), head.due_time),
                None => return Poll::Empty,
            };

            if !live {
                if let Some(stale) = self.queue.pop_earliest() {
                    trace!(id = %stale.id, "discarding stale queue slot");
                }
                continue;
            }

            if due_time > now {
                return Poll::NotDue(due_time);
            }

            let Some(slot) = self.queue.pop_due(now) else {
                return Poll::NotDue(due_time);
            };
            let Some(entry) = self.get_mut(&slot.id) else {
                continue;
            };

            let strategy = Arc::clone(&entry.strategy);
            if !strategy.should_run(entry, now) {
                debug!(
                    id = %entry.id,
                    execution_count = entry.execution_count,
                    "entry not eligible to run; dropping from queue"
                );
                continue;
            }

            entry.status = EntryStatus::Running;
            entry.execution_count += 1;

            return Poll::Ready(ReadyEntry {
                id: entry.id.clone(),
                name: entry.name().to_string(),
                task: Arc::clone(&entry.task),
                execution_count: entry.execution_count,
            });
        }
    }

    /// Apply the result of a run to the entry.
    ///
    /// - success: the strategy decides (Once → `Completed`, Periodic →
    ///   `Pending` and requeued at the next grid point)
    /// - failure: `Failed` with the message, never requeued
    /// - cancelled while running: the entry is removed either way
    ///
    /// Returns `None` if the entry is unknown.
    pub fn complete(
        &mut self,
        id: &str,
        outcome: &RunOutcome,
        duration: Duration,
        now: Instant,
    ) -> Option<AfterRun> {
        let entry = self.get_mut(id)?;
        entry.last_duration = Some(duration);

        let after = match outcome {
            RunOutcome::Succeeded => {
                let strategy = Arc::clone(&entry.strategy);
                strategy.on_completed(entry, now)
            }
            RunOutcome::Failed(message) => {
                entry.status = EntryStatus::Failed;
                entry.error_message = Some(message.clone());
                AfterRun::Finished
            }
        };

        if entry.cancel_requested {
            debug!(id = %id, "entry cancelled while running; removing");
            self.remove(id);
            return Some(AfterRun::Finished);
        }

        let due_time = entry.due_time;
        if after == AfterRun::Requeue {
            self.queue.insert(id.to_string(), due_time);
        }

        Some(after)
    }

    /// Cancel an entry.
    ///
    /// A pending entry is removed immediately (its queue slot goes stale);
    /// a running entry is removed once its current run finishes. Returns
    /// false for unknown or already terminal entries.
    pub fn cancel(&mut self, id: &str) -> bool {
        let Some(status) = self.get(id).map(|e| e.status) else {
            return false;
        };

        match status {
            EntryStatus::Pending => {
                self.remove(id);
                true
            }
            EntryStatus::Running => {
                if let Some(entry) = self.get_mut(id) {
                    entry.cancel_requested = true;
                }
                true
            }
            EntryStatus::Completed | EntryStatus::Failed => false,
        }
    }

    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics::default();
        for entry in self.entries.values() {
            stats.record(entry.status);
        }
        stats
    }

    pub fn snapshot(&self, id: &str) -> Option<EntrySnapshot> {
        self.get(id).map(ScheduledEntry::snapshot)
    }

    /// Snapshots of all known entries, in submission order.
    pub fn snapshots(&self) -> Vec<EntrySnapshot> {
        self.entries.values().map(ScheduledEntry::snapshot).collect()
    }

    /// Number of slots in the dispatch queue, stale ones included.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, id: &str) -> Option<&ScheduledEntry> {
        self.index.get(id).and_then(|seq| self.entries.get(seq))
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut ScheduledEntry> {
        let seq = self.index.get(id)?;
        self.entries.get_mut(seq)
    }

    fn remove(&mut self, id: &str) -> Option<ScheduledEntry> {
        let seq = self.index.remove(id)?;
        self.entries.remove(&seq)
    }

    fn is_live(&self, id: &str, due_time: Instant) -> bool {
        self.get(id)
            .is_some_and(|e| e.status == EntryStatus::Pending && e.due_time == due_time)
    }
}
