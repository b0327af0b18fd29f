#![allow(dead_code)]

pub use tasklane_test_utils::observer::{ObservedEvent, PanickingObserver, RecordingObserver};
pub use tasklane_test_utils::tasks::{ExecutionLog, ScriptedTask, execution_log};
pub use tasklane_test_utils::{init_tracing, wait_until, with_timeout};
