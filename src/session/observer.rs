//! Hooks through which the embedding host hears about store events.

use crate::error::Error;
use tracing::{error, info};

/// Receives informational and error events from the store and its cleanup
/// loop. Both hooks default to doing nothing.
pub trait SessionObserver: Send + Sync {
    fn info(&self, message: &str) {
        let _ = message;
    }

    fn error(&self, message: &str, error: &Error) {
        let _ = (message, error);
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Observer that forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn info(&self, message: &str) {
        info!(target: "flashkv_sessions::observer", "{}", message);
    }

    fn error(&self, message: &str, err: &Error) {
        error!(target: "flashkv_sessions::observer", error = %err, "{}", message);
    }
}

/// Observer that keeps every message, for assertions in tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
    infos: std::sync::Mutex<Vec<String>>,
    errors: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingObserver {
    pub(crate) fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub(crate) fn info_count(&self) -> usize {
        self.infos.lock().unwrap().len()
    }

    pub(crate) fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

#[cfg(test)]
impl SessionObserver for RecordingObserver {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str, _error: &Error) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}
