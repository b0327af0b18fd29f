// src/tasks/reminder.rs

use anyhow::Result;
use tracing::info;

use crate::engine::Task;

#[derive(Debug, Clone)]
pub struct ReminderTask {
    name: String,
    message: String,
}

impl ReminderTask {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "reminder".to_string(),
            message: message.into(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Task for ReminderTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> Result<()> {
        let rule = "=".repeat(50);
        println!("\n{rule}\nreminder: {}\n{rule}\n", self.message);
        info!(task = %self.name, message = %self.message, "reminder fired");
        Ok(())
    }
}
