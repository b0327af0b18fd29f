// src/tasks/http.rs

//! HTTP GET task.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::engine::Task;

/// Per-request timeout, connect included.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches `url` and writes the response body to `output`.
///
/// Connection errors and non-success statuses fail the task; the output
/// file is only written for a 2xx response.
#[derive(Debug, Clone)]
pub struct HttpGetTask {
    name: String,
    url: String,
    output: PathBuf,
    timeout: Duration,
}

impl HttpGetTask {
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            name: "http-get".to_string(),
            url: url.into(),
            output: output.into(),
            timeout: HTTP_TIMEOUT,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform the request and return the number of bytes written.
    pub fn fetch(&self) -> Result<usize> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("building HTTP client")?;

        let body = client
            .get(&self.url)
            .send()
            .with_context(|| format!("requesting {}", self.url))?
            .error_for_status()
            .with_context(|| format!("GET {} returned an error status", self.url))?
            .bytes()
            .with_context(|| format!("reading response body from {}", self.url))?;

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {:?}", parent))?;
        }
        fs::write(&self.output, &body)
            .with_context(|| format!("writing response to {:?}", self.output))?;

        info!(
            task = %self.name,
            url = %self.url,
            output = ?self.output,
            bytes = body.len(),
            "response saved"
        );
        Ok(body.len())
    }
}

impl Task for HttpGetTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> Result<()> {
        self.fetch().map(|_| ())
    }
}
