use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tasklane::engine::Task;

/// Shared log of task names in the order their bodies ran.
pub type ExecutionLog = Arc<Mutex<Vec<String>>>;

pub fn execution_log() -> ExecutionLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A task that can be told to sleep, fail or panic, and that counts and
/// logs its runs.
#[derive(Debug)]
pub struct ScriptedTask {
    name: String,
    runs: AtomicUsize,
    sleep: Duration,
    fail_with: Option<String>,
    panic_with: Option<String>,
    log: Option<ExecutionLog>,
}

impl ScriptedTask {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            runs: AtomicUsize::new(0),
            sleep: Duration::ZERO,
            fail_with: None,
            panic_with: None,
            log: None,
        }
    }

    pub fn sleeping(mut self, sleep: Duration) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn panicking(mut self, message: &str) -> Self {
        self.panic_with = Some(message.to_string());
        self
    }

    pub fn logging_to(mut self, log: &ExecutionLog) -> Self {
        self.log = Some(Arc::clone(log));
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Task for ScriptedTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> anyhow::Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.name.clone());
        }
        if !self.sleep.is_zero() {
            std::thread::sleep(self.sleep);
        }
        if let Some(message) = &self.panic_with {
            panic!("{message}");
        }
        match &self.fail_with {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }
}
