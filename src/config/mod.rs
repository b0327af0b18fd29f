// src/config/mod.rs

//! Configuration: the TOML task plan.
//!
//! - [`model`] holds the raw (deserialized) and validated config types.
//! - [`validate`] turns a [`RawConfigFile`] into a [`ConfigFile`].
//! - [`loader`] reads files from disk.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ConfigSection, RawConfigFile, RawTaskConfig, TaskBody, TaskKind, TaskSpec, Timing,
};
