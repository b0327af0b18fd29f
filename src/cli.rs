// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tasklane`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tasklane",
    version,
    about = "Run one-shot and periodic tasks from a TOML plan.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Tasklane.toml` in the current working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stop after this many seconds instead of waiting for Ctrl-C.
    ///
    /// Overrides `[config].run_for_secs`.
    #[arg(long, value_name = "SECS")]
    pub run_for: Option<f64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKLANE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
