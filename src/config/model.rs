// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::runtime::DEFAULT_STOP_TIMEOUT;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// stop_timeout_secs = 2.0
/// log_file = "logs/scheduler.log"
/// run_for_secs = 20.0
///
/// [task.backup]
/// kind = "file_backup"
/// source = "data"
/// dest = "backup"
/// delay_secs = 2.0
///
/// [task.matrix]
/// kind = "matrix_multiply"
/// size = 50
/// interval_secs = 5.0
/// ```
///
/// This is the *unvalidated* form; use
/// [`load_and_validate`](crate::config::load_and_validate) to obtain a
/// [`ConfigFile`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, RawTaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Grace period `stop` waits for the dispatch loop, in seconds.
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: f64,

    /// Optional file that receives a copy of the log output.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// How long the CLI keeps the scheduler running. `None` means until
    /// Ctrl-C.
    #[serde(default)]
    pub run_for_secs: Option<f64>,
}

fn default_stop_timeout_secs() -> f64 {
    DEFAULT_STOP_TIMEOUT.as_secs_f64()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            stop_timeout_secs: default_stop_timeout_secs(),
            log_file: None,
            run_for_secs: None,
        }
    }
}

impl ConfigSection {
    /// Only meaningful after validation (finite, > 0).
    pub fn stop_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.stop_timeout_secs).unwrap_or(DEFAULT_STOP_TIMEOUT)
    }

    pub fn run_for(&self) -> Option<Duration> {
        self.run_for_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

/// Which body a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    FileBackup,
    MatrixMultiply,
    ShellCommand,
    HttpGet,
    Reminder,
    RandomStats,
}

/// `[task.<name>]` section, as written.
///
/// Timing: exactly one of `delay_secs` (one-shot) or `interval_secs`
/// (periodic). Body fields depend on `kind`:
/// - `file_backup`: `source`, `dest`
/// - `matrix_multiply`: `size` (default 200)
/// - `shell_command`: `cmd`
/// - `http_get`: `url` (http or https), `output`
/// - `reminder`: `message`
/// - `random_stats`: `count` (default 1000)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTaskConfig {
    pub kind: TaskKind,

    #[serde(default)]
    pub delay_secs: Option<f64>,

    #[serde(default)]
    pub interval_secs: Option<f64>,

    #[serde(default)]
    pub source: Option<PathBuf>,

    #[serde(default)]
    pub dest: Option<PathBuf>,

    #[serde(default)]
    pub size: Option<usize>,

    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub output: Option<PathBuf>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub count: Option<usize>,
}

pub const DEFAULT_MATRIX_SIZE: usize = 200;
pub const DEFAULT_STATS_COUNT: usize = 1000;

/// Validated configuration.
///
/// Can only be constructed through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    /// Tasks in name order.
    pub tasks: Vec<TaskSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, tasks: Vec<TaskSpec>) -> Self {
        Self { config, tasks }
    }
}

/// A validated task: when it runs and what it does.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub name: String,
    pub timing: Timing,
    pub body: TaskBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Once { delay: Duration },
    Periodic { interval: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskBody {
    FileBackup { source: PathBuf, dest: PathBuf },
    MatrixMultiply { size: usize },
    ShellCommand { cmd: String },
    HttpGet { url: String, output: PathBuf },
    Reminder { message: String },
    RandomStats { count: usize },
}
