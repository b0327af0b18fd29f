// src/tasks/mod.rs

//! Concrete task bodies and the factory that builds them.
//!
//! The engine only sees [`Task`](crate::engine::Task); everything here is
//! ordinary synchronous code run on the blocking pool.
//!
//! - [`backup`]: copy a directory tree into a timestamped folder.
//! - [`compute`]: CPU-bound samples (matrix multiply, random statistics).
//! - [`command`]: run a shell command.
//! - [`http`]: fetch a URL into a file.
//! - [`reminder`]: print a reminder banner.
//! - [`factory`]: build any of the above from parameters or a config spec.

pub mod backup;
pub mod command;
pub mod compute;
pub mod factory;
pub mod http;
pub mod reminder;

pub use backup::FileBackupTask;
pub use command::ShellCommandTask;
pub use compute::{MAX_MATRIX_SIZE, MatrixMultiplyTask, RandomStatsTask, mean_and_variance};
pub use factory::TaskFactory;
pub use http::HttpGetTask;
pub use reminder::ReminderTask;
