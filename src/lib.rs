// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod tasks;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, TaskSpec, Timing};
use crate::engine::{ConsoleObserver, EntryId, Scheduler, SchedulerOptions, Statistics};
use crate::tasks::TaskFactory;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the scheduler engine
/// - the console observer
/// - tasks built from the validated config
/// - the run duration / Ctrl-C handling
pub async fn run(args: CliArgs, cfg: ConfigFile) -> Result<()> {
    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let run_for = match args.run_for {
        Some(secs) => Some(Duration::try_from_secs_f64(secs).map_err(|_| {
            anyhow::anyhow!("--run-for must be a finite, non-negative number (got {secs})")
        })?),
        None => cfg.config.run_for(),
    };

    let scheduler = Scheduler::new(SchedulerOptions {
        stop_timeout: cfg.config.stop_timeout(),
    });
    scheduler.add_observer(Arc::new(ConsoleObserver));

    let ids = schedule_tasks(&scheduler, &cfg)?;
    info!(tasks = ids.len(), "tasks scheduled");

    scheduler.start()?;

    let shutdown = async move {
        match run_for {
            Some(duration) => {
                info!(run_for_ms = duration.as_millis() as u64, "running for a fixed duration");
                tokio::select! {
                    _ = tokio::time::sleep(duration) => Ok(()),
                    res = tokio::signal::ctrl_c() => res,
                }
            }
            None => {
                info!("running until Ctrl+C");
                tokio::signal::ctrl_c().await
            }
        }
    };
    run_until(&scheduler, shutdown).await;

    Ok(())
}

/// Wait for `shutdown`, then print statistics and stop `scheduler`.
///
/// A shutdown signal that fails (e.g. no Ctrl+C handler could be
/// installed) is logged and treated as a request to shut down, so the
/// scheduler is always stopped.
pub async fn run_until<F>(scheduler: &Scheduler, shutdown: F) -> Statistics
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = shutdown.await {
        warn!(error = %e, "shutdown signal failed; stopping the scheduler");
    }

    let stats = scheduler.statistics();
    print_statistics(&stats);
    scheduler.stop().await;
    stats
}

/// Submit every configured task to `scheduler`, in config (name) order.
pub fn schedule_tasks(scheduler: &Scheduler, cfg: &ConfigFile) -> crate::errors::Result<Vec<EntryId>> {
    cfg.tasks
        .iter()
        .map(|spec| schedule_task(scheduler, spec))
        .collect()
}

pub fn schedule_task(scheduler: &Scheduler, spec: &TaskSpec) -> crate::errors::Result<EntryId> {
    let task = TaskFactory::from_spec(spec);
    match spec.timing {
        Timing::Once { delay } => Ok(scheduler.submit_once(task, delay)),
        Timing::Periodic { interval } => scheduler.submit_periodic(task, interval),
    }
}

fn print_statistics(stats: &Statistics) {
    println!();
    println!("statistics:");
    println!("  total:     {}", stats.total);
    println!("  pending:   {}", stats.pending);
    println!("  running:   {}", stats.running);
    println!("  completed: {}", stats.completed);
    println!("  failed:    {}", stats.failed);
}

/// Simple dry-run output: print tasks, timing and bodies.
fn print_dry_run(cfg: &ConfigFile) {
    println!("tasklane dry-run");
    println!("  config.stop_timeout_secs = {}", cfg.config.stop_timeout_secs);
    if let Some(ref path) = cfg.config.log_file {
        println!("  config.log_file = {}", path.display());
    }
    if let Some(secs) = cfg.config.run_for_secs {
        println!("  config.run_for_secs = {secs}");
    }
    println!();

    println!("tasks ({}):", cfg.tasks.len());
    for spec in &cfg.tasks {
        println!("  - {}", spec.name);
        match spec.timing {
            Timing::Once { delay } => println!("      once after {:.3}s", delay.as_secs_f64()),
            Timing::Periodic { interval } => {
                println!("      every {:.3}s", interval.as_secs_f64())
            }
        }
        println!("      body: {:?}", spec.body);
    }

    debug!("dry-run complete (no execution)");
}
