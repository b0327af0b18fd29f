// src/tasks/factory.rs

//! Builds task bodies from parameters, decoupling construction from
//! scheduling.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{TaskBody, TaskSpec};
use crate::engine::Task;
use crate::tasks::{
    FileBackupTask, HttpGetTask, MatrixMultiplyTask, RandomStatsTask, ReminderTask,
    ShellCommandTask,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFactory;

impl TaskFactory {
    pub fn file_backup(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Arc<dyn Task> {
        Arc::new(FileBackupTask::new(source, dest))
    }

    pub fn matrix_multiply(size: usize) -> Arc<dyn Task> {
        Arc::new(MatrixMultiplyTask::new(size))
    }

    pub fn shell_command(cmd: impl Into<String>) -> Arc<dyn Task> {
        Arc::new(ShellCommandTask::new(cmd))
    }

    pub fn http_get(url: impl Into<String>, output: impl Into<PathBuf>) -> Arc<dyn Task> {
        Arc::new(HttpGetTask::new(url, output))
    }

    pub fn reminder(message: impl Into<String>) -> Arc<dyn Task> {
        Arc::new(ReminderTask::new(message))
    }

    pub fn random_stats(count: usize) -> Arc<dyn Task> {
        Arc::new(RandomStatsTask::new(count))
    }

    /// Build the body described by a validated config entry, named after
    /// its `[task.<name>]` key.
    pub fn from_spec(spec: &TaskSpec) -> Arc<dyn Task> {
        let name = spec.name.clone();
        match &spec.body {
            TaskBody::FileBackup { source, dest } => {
                Arc::new(FileBackupTask::new(source.clone(), dest.clone()).named(name))
            }
            TaskBody::MatrixMultiply { size } => {
                Arc::new(MatrixMultiplyTask::new(*size).named(name))
            }
            TaskBody::ShellCommand { cmd } => {
                Arc::new(ShellCommandTask::new(cmd.clone()).named(name))
            }
            TaskBody::HttpGet { url, output } => {
                Arc::new(HttpGetTask::new(url.clone(), output.clone()).named(name))
            }
            TaskBody::Reminder { message } => {
                Arc::new(ReminderTask::new(message.clone()).named(name))
            }
            TaskBody::RandomStats { count } => {
                Arc::new(RandomStatsTask::new(*count).named(name))
            }
        }
    }
}
