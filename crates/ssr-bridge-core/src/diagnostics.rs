//! Diagnostics sinks: where extracted render errors are reported.

use std::sync::{Arc, Mutex};

/// Receives one warning per extracted error diagnostic.
pub trait DiagnosticsSink: Send + Sync {
    fn warn(&self, message: &str);

    /// Warning raised while rendering `component`. The renderer calls this;
    /// sinks that don't track components get plain [`warn`](Self::warn).
    fn warn_for(&self, _component: &str, message: &str) {
        self.warn(message)
    }
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for Arc<T> {
    fn warn(&self, message: &str) {
        (**self).warn(message)
    }

    fn warn_for(&self, component: &str, message: &str) {
        (**self).warn_for(component, message)
    }
}

/// Forwards diagnostics to `tracing` at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!(event = "render.diagnostic", "{}", message);
    }

    fn warn_for(&self, component: &str, message: &str) {
        tracing::warn!(event = "render.diagnostic", component = %component, "{}", message);
    }
}

/// Collects diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl DiagnosticsSink for MemorySink {
    fn warn(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}
