// src/engine/runtime.rs

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::engine::core::{Poll, ReadyEntry, RunOutcome, SchedulerCore};
use crate::engine::entry::{EntrySnapshot, ScheduledEntry};
use crate::engine::observer::{ObserverRegistry, TaskObserver};
use crate::engine::strategy::{AfterRun, due_after};
use crate::engine::{EntryId, Statistics, Task, panic_message};
use crate::errors::{Result, SchedulerError};

/// Default grace period `stop` waits for the dispatch loop to exit.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// How long `stop` waits for the dispatch loop before giving up on it.
    pub stop_timeout: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

/// State shared between the public handle and the dispatch loop.
struct Shared {
    core: Mutex<SchedulerCore>,
    /// Wakes the dispatch loop after an insert. A notification sent while
    /// the loop is busy is stored and consumed by its next wait.
    wake: Notify,
    observers: ObserverRegistry,
    next_id: AtomicU64,
}

impl Shared {
    fn lock_core(&self) -> MutexGuard<'_, SchedulerCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Dispatcher {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// In-process task scheduler.
///
/// Cheap to clone; all clones drive the same engine. Any number of callers
/// may submit concurrently, while a single dispatch loop (spawned by
/// [`start`](Self::start)) runs due task bodies one at a time. A slow body
/// therefore delays everything queued behind it, but task bodies of one
/// scheduler never overlap and only the loop mutates entry status.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
    // Kept out of `Shared` so the loop does not keep its own shutdown
    // sender alive: dropping every handle ends the loop.
    dispatcher: Arc<Mutex<Option<Dispatcher>>>,
    options: SchedulerOptions,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("options", &self.options)
            .field("running", &self.is_running())
            .field("statistics", &self.statistics())
            .finish_non_exhaustive()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerOptions::default())
    }
}

impl Scheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(SchedulerCore::new()),
                wake: Notify::new(),
                observers: ObserverRegistry::new(),
                next_id: AtomicU64::new(0),
            }),
            dispatcher: Arc::new(Mutex::new(None)),
            options,
        }
    }

    /// Schedule `task` to run once, `delay` from now.
    ///
    /// Observers see `on_created` before the entry can be dispatched. A
    /// delay beyond [`FAR_FUTURE`](crate::engine::strategy::FAR_FUTURE) is clamped to it.
    pub fn submit_once(&self, task: Arc<dyn Task>, delay: Duration) -> EntryId {
        let id = self.next_id();
        let entry = ScheduledEntry::once(id.clone(), task, due_after(Instant::now(), delay));
        let name = entry.name().to_string();

        info!(id = %id, task = %name, delay_ms = delay.as_millis() as u64, "task created");
        self.shared.observers.notify_created(&id, &name);
        self.enqueue(entry);

        id
    }

    /// Schedule `task` to run every `interval`, first run one interval
    /// from now.
    ///
    /// Fails with [`SchedulerError::InvalidArgument`] for a zero interval,
    /// without touching the queue.
    pub fn submit_periodic(&self, task: Arc<dyn Task>, interval: Duration) -> Result<EntryId> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidArgument(format!(
                "periodic interval for task '{}' must be greater than zero",
                task.name()
            )));
        }

        let id = self.next_id();
        let first_due = due_after(Instant::now(), interval);
        let entry = ScheduledEntry::periodic(id.clone(), task, first_due, interval);
        let name = entry.name().to_string();

        info!(
            id = %id,
            task = %name,
            interval_ms = interval.as_millis() as u64,
            "periodic task created"
        );
        self.shared.observers.notify_created(&id, &name);
        self.enqueue(entry);

        Ok(id)
    }

    /// Spawn the dispatch loop on the current tokio runtime.
    pub fn start(&self) -> Result<()> {
        let mut dispatcher = self.lock_dispatcher();
        if dispatcher.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let handle = runtime.spawn(run_dispatch_loop(shared, shutdown_rx));

        *dispatcher = Some(Dispatcher { shutdown, handle });
        info!("scheduler started");
        Ok(())
    }

    /// Ask the dispatch loop to exit and wait up to `stop_timeout` for it.
    ///
    /// Idempotent. A task body that is still executing when the grace
    /// period runs out is left to finish on its own; `stop` returns anyway.
    pub async fn stop(&self) {
        let Some(Dispatcher { shutdown, handle }) = self.lock_dispatcher().take() else {
            debug!("stop requested but scheduler is not running");
            return;
        };

        let _ = shutdown.send(true);

        match tokio::time::timeout(self.options.stop_timeout, handle).await {
            Ok(Ok(())) => info!("scheduler stopped"),
            Ok(Err(e)) => warn!(error = %e, "dispatch loop ended abnormally"),
            Err(_) => warn!(
                timeout_ms = self.options.stop_timeout.as_millis() as u64,
                "dispatch loop did not exit within the stop timeout; detaching it"
            ),
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_dispatcher().is_some()
    }

    pub fn statistics(&self) -> Statistics {
        self.shared.lock_core().statistics()
    }

    pub fn entry(&self, id: &str) -> Option<EntrySnapshot> {
        self.shared.lock_core().snapshot(id)
    }

    pub fn entries(&self) -> Vec<EntrySnapshot> {
        self.shared.lock_core().snapshots()
    }

    /// Cancel a pending or running entry. See [`SchedulerCore::cancel`].
    pub fn cancel(&self, id: &str) -> bool {
        let cancelled = self.shared.lock_core().cancel(id);
        if cancelled {
            info!(id = %id, "task cancelled");
            // Let the loop re-evaluate its wait; the head may have gone stale.
            self.shared.wake.notify_one();
        }
        cancelled
    }

    /// Number of slots currently in the dispatch queue.
    pub fn queued_len(&self) -> usize {
        self.shared.lock_core().queue_len()
    }

    pub fn add_observer(&self, observer: Arc<dyn TaskObserver>) -> bool {
        self.shared.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Arc<dyn TaskObserver>) -> bool {
        self.shared.observers.remove(observer)
    }

    fn enqueue(&self, entry: ScheduledEntry) {
        self.shared.lock_core().insert(entry);
        self.shared.wake.notify_one();
    }

    fn next_id(&self) -> EntryId {
        let n = self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("TASK_{n:06}")
    }

    fn lock_dispatcher(&self) -> MutexGuard<'_, Option<Dispatcher>> {
        self.dispatcher.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The single dispatch loop.
///
/// Waits for the earliest due entry (or any insert, or shutdown), then
/// executes it to completion before looking at the queue again.
async fn run_dispatch_loop(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    debug!("dispatch loop started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let poll = shared.lock_core().poll(Instant::now());

        match poll {
            Poll::Ready(ready) => dispatch(&shared, ready).await,
            Poll::NotDue(due_time) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(due_time) => {}
                    _ = shared.wake.notified() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            Poll::Empty => {
                tokio::select! {
                    _ = shared.wake.notified() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    debug!("dispatch loop finished");
}

/// Execute one popped entry and apply its transition.
async fn dispatch(shared: &Shared, ready: ReadyEntry) {
    let ReadyEntry {
        id,
        name,
        task,
        execution_count,
    } = ready;

    info!(id = %id, task = %name, execution_count, "task started");
    shared.observers.notify_started(&id, &name);

    let started = Instant::now();
    let outcome = run_body(task).await;
    let duration = started.elapsed();

    let after = shared
        .lock_core()
        .complete(&id, &outcome, duration, Instant::now());

    match outcome {
        RunOutcome::Succeeded => {
            info!(
                id = %id,
                task = %name,
                duration_ms = duration.as_millis() as u64,
                requeued = after == Some(AfterRun::Requeue),
                "task completed"
            );
            shared.observers.notify_completed(&id, &name, duration);
        }
        RunOutcome::Failed(message) => {
            error!(id = %id, task = %name, error = %message, "task failed");
            shared.observers.notify_failed(&id, &name, &message);
        }
    }
}

/// Run a task body on the blocking pool and wait for it.
///
/// Errors and panics both become [`RunOutcome::Failed`].
async fn run_body(task: Arc<dyn Task>) -> RunOutcome {
    match tokio::task::spawn_blocking(move || task.execute()).await {
        Ok(Ok(())) => RunOutcome::Succeeded,
        Ok(Err(err)) => RunOutcome::Failed(format!("{err:#}")),
        Err(join_err) if join_err.is_panic() => {
            RunOutcome::Failed(panic_message(join_err.into_panic().as_ref()))
        }
        Err(join_err) => RunOutcome::Failed(join_err.to_string()),
    }
}
