//! Error types and reporting for background session tasks.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Errors surfaced by a background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task dropped one unit of work and keeps running.
    Recoverable(String),
    /// The task cannot continue.
    Fatal(String),
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            TaskError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for TaskError {}

/// Trait for reporting task errors.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, task: &str, error: &TaskError);
}

/// Reporter that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, task: &str, error: &TaskError) {
        match error {
            TaskError::Recoverable(msg) => tracing::warn!(task, "{msg}"),
            TaskError::Fatal(msg) => tracing::error!(task, "{msg}"),
        }
    }
}

/// Reporter that keeps every report, for assertions.
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    reports: Arc<Mutex<Vec<(String, TaskError)>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(String, TaskError)> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, task: &str, error: &TaskError) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((task.to_string(), error.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_display() {
        let recoverable = TaskError::Recoverable("temporary failure".to_string());
        assert_eq!(
            recoverable.to_string(),
            "Recoverable error: temporary failure"
        );

        let fatal = TaskError::Fatal("critical failure".to_string());
        assert_eq!(fatal.to_string(), "Fatal error: critical failure");
    }

    #[test]
    fn test_log_reporter() {
        let reporter = LogReporter;
        // Just ensure it doesn't panic without a subscriber
        reporter.report("segmenter", &TaskError::Recoverable("test error".to_string()));
    }

    #[test]
    fn collecting_reporter_keeps_order() {
        let reporter = CollectingReporter::new();
        reporter.report("a", &TaskError::Recoverable("one".into()));
        reporter.report("b", &TaskError::Fatal("two".into()));
        let reports = reporter.reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].0, "a");
        assert_eq!(reports[1].1, TaskError::Fatal("two".into()));
    }
}
