// src/engine/strategy.rs

//! Once / Periodic execution strategies.
//!
//! A strategy answers two questions for the dispatch loop:
//! - is this popped entry eligible to run now?
//! - what happens to it after a *successful* run?
//!
//! Failures never reach `on_completed`; the core marks the entry `Failed`
//! and it is not rescheduled, whatever its strategy.

use std::fmt::Debug;
use std::time::Duration;

use tokio::time::Instant;

use crate::engine::entry::ScheduledEntry;
use crate::engine::EntryStatus;

/// What the core should do with an entry once `on_completed` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterRun {
    /// Terminal; leave the entry out of the queue.
    Finished,
    /// Re-insert the entry at its (already updated) `due_time`.
    Requeue,
}

pub trait ExecutionStrategy: Send + Sync + Debug {
    fn should_run(&self, entry: &ScheduledEntry, now: Instant) -> bool;

    /// Apply the post-success transition to `entry`.
    fn on_completed(&self, entry: &mut ScheduledEntry, now: Instant) -> AfterRun;
}

/// Fires exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnceStrategy;

impl ExecutionStrategy for OnceStrategy {
    fn should_run(&self, entry: &ScheduledEntry, now: Instant) -> bool {
        entry.execution_count == 0 && now >= entry.due_time
    }

    fn on_completed(&self, entry: &mut ScheduledEntry, _now: Instant) -> AfterRun {
        entry.status = EntryStatus::Completed;
        AfterRun::Finished
    }
}

/// Fires every `interval`, anchored to the first due time.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicStrategy {
    interval: Duration,
}

impl PeriodicStrategy {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl ExecutionStrategy for PeriodicStrategy {
    fn should_run(&self, entry: &ScheduledEntry, now: Instant) -> bool {
        now >= entry.due_time
    }

    fn on_completed(&self, entry: &mut ScheduledEntry, now: Instant) -> AfterRun {
        entry.due_time = next_due_time(entry.due_time, self.interval, now);
        entry.status = EntryStatus::Pending;
        AfterRun::Requeue
    }
}

/// Furthest due time the engine schedules: roughly thirty years out.
pub const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + delay`, clamped to `now + FAR_FUTURE`.
///
/// Delays too large for the platform clock never panic; such an entry just
/// stays pending for the lifetime of the process.
pub fn due_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay.min(FAR_FUTURE))
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Advance `previous` by whole multiples of `interval` until it lies after
/// `now`.
///
/// Normally this is a single step, so due times form an exact
/// `previous + k * interval` grid and do not drift with execution time.
/// Ticks missed while a slow body ran are coalesced into the next one.
/// A grid point beyond the clock's range falls back to [`due_after`].
pub fn next_due_time(previous: Instant, interval: Duration, now: Instant) -> Instant {
    let Some(next) = previous.checked_add(interval) else {
        return due_after(now, interval);
    };
    if next > now {
        return next;
    }

    let behind = now.duration_since(next).as_nanos();
    let skipped = behind / interval.as_nanos().max(1) + 1;
    let skipped = u32::try_from(skipped).unwrap_or(u32::MAX);

    next.checked_add(interval.saturating_mul(skipped))
        .unwrap_or_else(|| due_after(now, interval))
}
