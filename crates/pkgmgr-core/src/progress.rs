//! Human-readable progress messages.

use std::sync::Mutex;

/// Receives a message before each major step is attempted.
pub trait ProgressReporter: Send + Sync + std::fmt::Debug {
    fn report(&self, message: &str);
}

/// Forwards progress to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// Keeps every message in memory. Useful for tests and for frontends that
/// render progress after the fact.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, message: &str) {
        tracing::info!("{}", message);
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}
