use std::path::PathBuf;

use clap::Parser;
use tasklane::cli::{CliArgs, LogLevel};
use tasklane::logging::parse_level_str;

#[test]
fn defaults_leave_everything_to_the_config() {
    let args = CliArgs::try_parse_from(["tasklane"]).unwrap();
    assert_eq!(args.config, None);
    assert_eq!(args.run_for, None);
    assert!(args.log_level.is_none());
    assert!(!args.dry_run);
}

#[test]
fn flags_are_parsed() {
    let args = CliArgs::try_parse_from([
        "tasklane",
        "--config",
        "plans/nightly.toml",
        "--run-for",
        "2.5",
        "--log-level",
        "debug",
        "--dry-run",
    ])
    .unwrap();

    assert_eq!(args.config, Some(PathBuf::from("plans/nightly.toml")));
    assert_eq!(args.run_for, Some(2.5));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(args.dry_run);
}

#[test]
fn unknown_log_level_is_rejected() {
    assert!(CliArgs::try_parse_from(["tasklane", "--log-level", "loud"]).is_err());
}

#[test]
fn env_level_strings() {
    assert_eq!(parse_level_str(" WARNING "), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str("trace"), Some(tracing::Level::TRACE));
    assert_eq!(parse_level_str("verbose"), None);
}
