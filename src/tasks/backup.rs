// src/tasks/backup.rs

//! Directory backup task.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::engine::Task;

/// Copies `source` recursively into `dest/backup_<unix-seconds>`.
#[derive(Debug, Clone)]
pub struct FileBackupTask {
    name: String,
    source: PathBuf,
    dest: PathBuf,
}

impl FileBackupTask {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            name: "file-backup".to_string(),
            source: source.into(),
            dest: dest.into(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Run the backup and return the directory it was written to.
    pub fn run_backup(&self) -> Result<PathBuf> {
        if !self.source.is_dir() {
            bail!("backup source {:?} is not a directory", self.source);
        }

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock is before the unix epoch")?
            .as_secs();
        let target = self.dest.join(format!("backup_{stamp}"));

        let copied = copy_tree(&self.source, &target)?;
        info!(
            task = %self.name,
            source = ?self.source,
            target = ?target,
            files = copied,
            "backup complete"
        );
        Ok(target)
    }
}

impl Task for FileBackupTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> Result<()> {
        self.run_backup().map(|_| ())
    }
}

/// Copy a directory tree, returning the number of files copied.
fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    fs::create_dir_all(to).with_context(|| format!("creating dir {:?}", to))?;

    let mut copied = 0;
    for entry in fs::read_dir(from).with_context(|| format!("reading dir {:?}", from))? {
        let entry = entry?;
        let path = entry.path();
        let target = to.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copied += copy_tree(&path, &target)?;
        } else {
            fs::copy(&path, &target)
                .with_context(|| format!("copying {:?} to {:?}", path, target))?;
            debug!(from = ?path, to = ?target, "copied file");
            copied += 1;
        }
    }
    Ok(copied)
}
