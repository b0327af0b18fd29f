// src/tasks/command.rs

//! Shell command task.

use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::engine::Task;

/// Runs `cmd` through the platform shell and fails on a non-zero exit.
#[derive(Debug, Clone)]
pub struct ShellCommandTask {
    name: String,
    cmd: String,
}

impl ShellCommandTask {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            name: "shell-command".to_string(),
            cmd: cmd.into(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }
}

impl Task for ShellCommandTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> Result<()> {
        info!(task = %self.name, cmd = %self.cmd, "starting command");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        let output = cmd
            .output()
            .with_context(|| format!("spawning process for task '{}'", self.name))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(task = %self.name, "stdout: {}", line);
        }

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                bail!("command exited with status {code}");
            }
            bail!("command exited with status {code}: {stderr}");
        }

        Ok(())
    }
}
