// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{
    ConfigFile, ConfigSection, DEFAULT_MATRIX_SIZE, DEFAULT_STATS_COUNT, RawConfigFile,
    RawTaskConfig, TaskBody, TaskKind, TaskSpec, Timing,
};
use crate::engine::strategy::FAR_FUTURE;
use crate::errors::{Result, SchedulerError};
use crate::tasks::MAX_MATRIX_SIZE;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SchedulerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        validate_global_config(&raw.config)?;

        let tasks = raw
            .task
            .iter()
            .map(|(name, task)| validate_task(name, task))
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigFile::new_unchecked(raw.config, tasks))
    }
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SchedulerError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &ConfigSection) -> Result<()> {
    positive_secs("[config].stop_timeout_secs", cfg.stop_timeout_secs)?;
    if let Some(run_for) = cfg.run_for_secs {
        positive_secs("[config].run_for_secs", run_for)?;
    }
    Ok(())
}

fn validate_task(name: &str, task: &RawTaskConfig) -> Result<TaskSpec> {
    let timing = match (task.delay_secs, task.interval_secs) {
        (Some(delay), None) => Timing::Once {
            delay: non_negative_secs(&format!("task '{name}' delay_secs"), delay)?,
        },
        (None, Some(interval)) => Timing::Periodic {
            interval: positive_secs(&format!("task '{name}' interval_secs"), interval)?,
        },
        (Some(_), Some(_)) => {
            return Err(SchedulerError::ConfigError(format!(
                "task '{name}' sets both delay_secs and interval_secs; pick one"
            )));
        }
        (None, None) => {
            return Err(SchedulerError::ConfigError(format!(
                "task '{name}' needs either delay_secs (run once) or interval_secs (periodic)"
            )));
        }
    };

    let body = match task.kind {
        TaskKind::FileBackup => TaskBody::FileBackup {
            source: required(name, "source", task.source.clone())?,
            dest: required(name, "dest", task.dest.clone())?,
        },
        TaskKind::MatrixMultiply => TaskBody::MatrixMultiply {
            size: at_most(
                name,
                "size",
                at_least_one(name, "size", task.size.unwrap_or(DEFAULT_MATRIX_SIZE))?,
                MAX_MATRIX_SIZE,
            )?,
        },
        TaskKind::ShellCommand => {
            let cmd = required(name, "cmd", task.cmd.clone())?;
            if cmd.trim().is_empty() {
                return Err(SchedulerError::ConfigError(format!(
                    "task '{name}' has an empty cmd"
                )));
            }
            TaskBody::ShellCommand { cmd }
        }
        TaskKind::HttpGet => TaskBody::HttpGet {
            url: http_url(name, required(name, "url", task.url.clone())?)?,
            output: required(name, "output", task.output.clone())?,
        },
        TaskKind::Reminder => TaskBody::Reminder {
            message: required(name, "message", task.message.clone())?,
        },
        TaskKind::RandomStats => TaskBody::RandomStats {
            count: at_least_one(name, "count", task.count.unwrap_or(DEFAULT_STATS_COUNT))?,
        },
    };

    Ok(TaskSpec {
        name: name.to_string(),
        timing,
        body,
    })
}

fn required<T>(task: &str, field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| {
        SchedulerError::ConfigError(format!("task '{task}' is missing required field `{field}`"))
    })
}

fn http_url(task: &str, url: String) -> Result<String> {
    let parsed = reqwest::Url::parse(&url).map_err(|e| {
        SchedulerError::ConfigError(format!("task '{task}' has an invalid url {url:?}: {e}"))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SchedulerError::ConfigError(format!(
            "task '{task}' url must use http or https (got {url:?})"
        )));
    }
    Ok(url)
}

fn at_least_one(task: &str, field: &str, value: usize) -> Result<usize> {
    if value == 0 {
        return Err(SchedulerError::ConfigError(format!(
            "task '{task}' {field} must be >= 1 (got 0)"
        )));
    }
    Ok(value)
}

fn at_most(task: &str, field: &str, value: usize, max: usize) -> Result<usize> {
    if value > max {
        return Err(SchedulerError::ConfigError(format!(
            "task '{task}' {field} must be <= {max} (got {value})"
        )));
    }
    Ok(value)
}

fn non_negative_secs(what: &str, secs: f64) -> Result<Duration> {
    let duration = Duration::try_from_secs_f64(secs).map_err(|_| {
        SchedulerError::ConfigError(format!(
            "{what} must be a finite, non-negative number of seconds (got {secs})"
        ))
    })?;
    if duration > FAR_FUTURE {
        return Err(SchedulerError::ConfigError(format!(
            "{what} must be at most {} seconds (got {secs})",
            FAR_FUTURE.as_secs()
        )));
    }
    Ok(duration)
}

fn positive_secs(what: &str, secs: f64) -> Result<Duration> {
    let duration = non_negative_secs(what, secs)?;
    if duration.is_zero() {
        return Err(SchedulerError::ConfigError(format!(
            "{what} must be greater than zero (got {secs})"
        )));
    }
    Ok(duration)
}
