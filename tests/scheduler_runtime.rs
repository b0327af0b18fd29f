// tests/scheduler_runtime.rs

mod common;
use crate::common::{
    RecordingObserver, ScriptedTask, execution_log, init_tracing, wait_until, with_timeout,
};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tasklane::engine::{EntryStatus, Scheduler, SchedulerOptions, TaskObserver};
use tasklane::errors::SchedulerError;
use tasklane::run_until;
use tokio::time::{Instant, sleep};

type TestResult = Result<(), Box<dyn Error>>;

const SETTLE: Duration = Duration::from_secs(2);

#[tokio::test]
async fn runs_due_tasks_in_due_time_order() -> TestResult {
    init_tracing();
    let log = execution_log();
    let scheduler = Scheduler::default();

    scheduler.submit_once(ScriptedTask::new("a").logging_to(&log).build(), Duration::from_millis(90));
    scheduler.submit_once(ScriptedTask::new("b").logging_to(&log).build(), Duration::from_millis(10));
    scheduler.submit_once(ScriptedTask::new("c").logging_to(&log).build(), Duration::from_millis(50));
    scheduler.start()?;

    assert!(wait_until(SETTLE, || scheduler.statistics().completed == 3).await);
    assert_eq!(*log.lock().unwrap(), vec!["b", "c", "a"]);

    scheduler.stop().await;
    Ok(())
}

#[tokio::test]
async fn once_task_runs_exactly_once() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();
    let task = ScriptedTask::new("once").build();

    let id = scheduler.submit_once(task.clone(), Duration::ZERO);
    assert_eq!(id, "TASK_000001");
    scheduler.start()?;

    assert!(wait_until(SETTLE, || scheduler.statistics().completed == 1).await);
    sleep(Duration::from_millis(150)).await;

    assert_eq!(task.runs(), 1);
    let snap = scheduler.entry(&id).ok_or("entry missing")?;
    assert_eq!(snap.status, EntryStatus::Completed);
    assert_eq!(snap.execution_count, 1);
    assert!(snap.last_duration.is_some());

    scheduler.stop().await;
    Ok(())
}

#[tokio::test]
async fn once_and_periodic_side_by_side() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();
    let once = ScriptedTask::new("A").build();
    let tick = ScriptedTask::new("B").build();

    let once_id = scheduler.submit_once(once.clone(), Duration::ZERO);
    let tick_id = scheduler.submit_periodic(tick.clone(), Duration::from_millis(200))?;
    scheduler.start()?;

    sleep(Duration::from_millis(700)).await;
    scheduler.stop().await;

    assert_eq!(once.runs(), 1);
    assert_eq!(tick.runs(), 3);

    let stats = scheduler.statistics();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pending, 1);

    assert_eq!(scheduler.entry(&once_id).map(|e| e.status), Some(EntryStatus::Completed));
    let tick_snap = scheduler.entry(&tick_id).ok_or("entry missing")?;
    assert_eq!(tick_snap.status, EntryStatus::Pending);
    assert_eq!(tick_snap.execution_count, 3);
    assert!(tick_snap.is_periodic());
    Ok(())
}

#[tokio::test]
async fn periodic_task_with_long_interval_does_not_run_early() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();
    let task = ScriptedTask::new("hourly").build();

    scheduler.submit_periodic(task.clone(), Duration::from_secs(3600))?;
    scheduler.start()?;
    sleep(Duration::from_millis(200)).await;
    scheduler.stop().await;

    assert_eq!(task.runs(), 0);
    assert_eq!(scheduler.statistics().pending, 1);
    Ok(())
}

#[tokio::test]
async fn zero_interval_is_rejected_without_side_effects() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();

    let err = scheduler
        .submit_periodic(ScriptedTask::new("spin").build(), Duration::ZERO)
        .unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidArgument(_)));
    assert!(err.to_string().contains("spin"));

    assert_eq!(scheduler.statistics().total, 0);
    assert_eq!(scheduler.queued_len(), 0);
    assert!(scheduler.entries().is_empty());
    Ok(())
}

#[tokio::test]
async fn start_twice_is_rejected_and_stop_is_idempotent() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();

    scheduler.start()?;
    assert!(scheduler.is_running());
    assert!(matches!(scheduler.start(), Err(SchedulerError::AlreadyRunning)));

    scheduler.stop().await;
    assert!(!scheduler.is_running());
    scheduler.stop().await;
    assert!(!scheduler.is_running());
    Ok(())
}

#[test]
fn start_outside_a_runtime_fails() {
    let scheduler = Scheduler::default();
    assert!(matches!(scheduler.start(), Err(SchedulerError::NoRuntime)));
    assert!(!scheduler.is_running());
}

#[tokio::test]
async fn stop_without_start_is_a_noop() {
    init_tracing();
    let scheduler = Scheduler::default();
    with_timeout(scheduler.stop()).await;
    assert!(!scheduler.is_running());
}

#[tokio::test]
async fn scheduler_can_be_restarted_after_stop() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();

    scheduler.start()?;
    scheduler.stop().await;

    let task = ScriptedTask::new("after-restart").build();
    scheduler.submit_once(task.clone(), Duration::ZERO);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(task.runs(), 0, "nothing runs while stopped");

    scheduler.start()?;
    assert!(wait_until(SETTLE, || task.runs() == 1).await);
    scheduler.stop().await;
    Ok(())
}

#[tokio::test]
async fn failing_task_does_not_stop_the_scheduler() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();
    let recorder = RecordingObserver::new();
    scheduler.add_observer(recorder.clone());

    let bad = scheduler.submit_once(ScriptedTask::new("bad").failing("disk full").build(), Duration::ZERO);
    let good_task = ScriptedTask::new("good").build();
    let good = scheduler.submit_once(good_task.clone(), Duration::from_millis(20));
    scheduler.start()?;

    assert!(wait_until(SETTLE, || good_task.runs() == 1).await);
    assert!(wait_until(SETTLE, || scheduler.statistics().completed == 1).await);

    let bad_snap = scheduler.entry(&bad).ok_or("entry missing")?;
    assert_eq!(bad_snap.status, EntryStatus::Failed);
    assert!(bad_snap.error_message.as_deref().unwrap_or_default().contains("disk full"));
    assert_eq!(scheduler.entry(&good).map(|e| e.status), Some(EntryStatus::Completed));

    let failures = recorder.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, bad);
    assert!(failures[0].1.contains("disk full"));

    let stats = scheduler.statistics();
    assert_eq!((stats.total, stats.completed, stats.failed), (2, 1, 1));

    scheduler.stop().await;
    Ok(())
}

#[tokio::test]
async fn panicking_task_is_recorded_as_failed() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();

    let id = scheduler.submit_once(ScriptedTask::new("boom").panicking("kaboom").build(), Duration::ZERO);
    let next = ScriptedTask::new("next").build();
    scheduler.submit_once(next.clone(), Duration::from_millis(10));
    scheduler.start()?;

    assert!(wait_until(SETTLE, || next.runs() == 1).await);
    let snap = scheduler.entry(&id).ok_or("entry missing")?;
    assert_eq!(snap.status, EntryStatus::Failed);
    assert!(snap.error_message.as_deref().unwrap_or_default().contains("kaboom"));

    scheduler.stop().await;
    Ok(())
}

#[tokio::test]
async fn failed_periodic_task_stops_repeating() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();
    let task = ScriptedTask::new("flaky").failing("nope").build();

    let id = scheduler.submit_periodic(task.clone(), Duration::from_millis(50))?;
    scheduler.start()?;

    assert!(wait_until(SETTLE, || task.runs() == 1).await);
    sleep(Duration::from_millis(250)).await;
    scheduler.stop().await;

    assert_eq!(task.runs(), 1);
    assert_eq!(scheduler.entry(&id).map(|e| e.status), Some(EntryStatus::Failed));
    Ok(())
}

#[tokio::test]
async fn earlier_submission_wakes_a_sleeping_loop() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();
    let far = ScriptedTask::new("far").build();
    let near = ScriptedTask::new("near").build();

    scheduler.submit_once(far.clone(), Duration::from_secs(60));
    scheduler.start()?;
    sleep(Duration::from_millis(50)).await;

    let submitted = Instant::now();
    scheduler.submit_once(near.clone(), Duration::ZERO);
    assert!(wait_until(Duration::from_millis(500), || near.runs() == 1).await);
    assert!(submitted.elapsed() < Duration::from_millis(500));
    assert_eq!(far.runs(), 0);

    scheduler.stop().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submitting_is_not_blocked_by_a_running_task() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();
    let slow = ScriptedTask::new("slow").sleeping(Duration::from_millis(400)).build();

    scheduler.submit_once(slow.clone(), Duration::ZERO);
    scheduler.start()?;
    assert!(wait_until(SETTLE, || scheduler.statistics().running == 1).await);

    let submitted = Instant::now();
    let later = ScriptedTask::new("later").build();
    scheduler.submit_once(later.clone(), Duration::ZERO);
    let stats = scheduler.statistics();
    assert!(submitted.elapsed() < Duration::from_millis(100));
    assert_eq!((stats.running, stats.pending), (1, 1));

    // Bodies never overlap: `later` waits for `slow`.
    assert!(wait_until(SETTLE, || later.runs() == 1).await);
    assert_eq!(slow.runs(), 1);

    scheduler.stop().await;
    Ok(())
}

#[tokio::test]
async fn stop_gives_up_on_a_long_running_body() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::new(SchedulerOptions {
        stop_timeout: Duration::from_millis(100),
    });
    let slow = ScriptedTask::new("slow").sleeping(Duration::from_millis(800)).build();

    scheduler.submit_once(slow.clone(), Duration::ZERO);
    scheduler.start()?;
    assert!(wait_until(SETTLE, || slow.runs() == 1).await);

    let stopping = Instant::now();
    scheduler.stop().await;
    assert!(stopping.elapsed() < Duration::from_millis(600));
    assert!(!scheduler.is_running());
    Ok(())
}

#[tokio::test]
async fn cancelled_entry_never_runs() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();
    let task = ScriptedTask::new("cancelled").build();

    let id = scheduler.submit_once(task.clone(), Duration::from_millis(100));
    scheduler.start()?;
    assert!(scheduler.cancel(&id));
    assert!(!scheduler.cancel(&id));

    sleep(Duration::from_millis(250)).await;
    scheduler.stop().await;

    assert_eq!(task.runs(), 0);
    assert!(scheduler.entry(&id).is_none());
    assert_eq!(scheduler.statistics().total, 0);
    Ok(())
}

#[tokio::test]
async fn ids_are_unique_per_scheduler_and_entries_listed_in_order() -> TestResult {
    init_tracing();
    let first = Scheduler::default();
    let second = Scheduler::default();

    let a = first.submit_once(ScriptedTask::new("a").build(), Duration::from_secs(60));
    let b = first.submit_periodic(ScriptedTask::new("b").build(), Duration::from_secs(60))?;
    let c = second.submit_once(ScriptedTask::new("c").build(), Duration::from_secs(60));

    assert_eq!((a.as_str(), b.as_str()), ("TASK_000001", "TASK_000002"));
    assert_eq!(c, "TASK_000001");

    let names: Vec<String> = first.entries().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(first.queued_len(), 2);
    Ok(())
}

#[tokio::test]
async fn clones_share_one_engine() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();
    let handle = scheduler.clone();
    let task = ScriptedTask::new("shared").build();

    handle.submit_once(task.clone(), Duration::ZERO);
    scheduler.start()?;
    assert!(handle.is_running());
    assert!(wait_until(SETTLE, || task.runs() == 1).await);

    handle.stop().await;
    assert!(!scheduler.is_running());

    let dyn_observer: Arc<dyn TaskObserver> = RecordingObserver::new();
    assert!(scheduler.add_observer(dyn_observer.clone()));
    assert!(handle.remove_observer(&dyn_observer));
    Ok(())
}

#[tokio::test]
async fn huge_delay_and_interval_are_accepted_without_panicking() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();
    let once = ScriptedTask::new("someday").build();
    let tick = ScriptedTask::new("never-ticks").build();

    let once_id = scheduler.submit_once(once.clone(), Duration::MAX);
    let tick_id = scheduler.submit_periodic(tick.clone(), Duration::MAX)?;
    scheduler.start()?;
    sleep(Duration::from_millis(100)).await;
    scheduler.stop().await;

    assert_eq!((once.runs(), tick.runs()), (0, 0));
    assert_eq!(scheduler.entry(&once_id).map(|e| e.status), Some(EntryStatus::Pending));
    assert_eq!(scheduler.entry(&tick_id).map(|e| e.status), Some(EntryStatus::Pending));
    assert_eq!(scheduler.statistics().pending, 2);
    Ok(())
}

#[tokio::test]
async fn failed_shutdown_signal_still_stops_the_scheduler() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::default();
    let task = ScriptedTask::new("quick").build();
    scheduler.submit_once(task.clone(), Duration::ZERO);
    scheduler.start()?;
    assert!(wait_until(SETTLE, || task.runs() == 1).await);
    assert!(wait_until(SETTLE, || scheduler.statistics().completed == 1).await);

    let stats = run_until(&scheduler, async {
        Err(std::io::Error::other("signal handler unavailable"))
    })
    .await;

    assert!(!scheduler.is_running());
    assert_eq!((stats.total, stats.completed), (1, 1));
    Ok(())
}
