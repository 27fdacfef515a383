//! Global atomic counters for render observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lock-free render counters.
pub struct Metrics {
    renders_completed: AtomicU64,
    render_errors: AtomicU64,
    diagnostics_forwarded: AtomicU64,
    contexts_created: AtomicU64,
    contexts_reused: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            renders_completed: AtomicU64::new(0),
            render_errors: AtomicU64::new(0),
            diagnostics_forwarded: AtomicU64::new(0),
            contexts_created: AtomicU64::new(0),
            contexts_reused: AtomicU64::new(0),
        }
    }

    /// A render returned markup (with or without reported errors).
    pub fn inc_renders(&self) {
        self.renders_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "renders_completed", "counter incremented");
    }

    /// The bundle reported `hasErrors`.
    pub fn inc_render_errors(&self) {
        self.render_errors.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "render_errors", "counter incremented");
    }

    pub fn add_diagnostics(&self, n: u64) {
        self.diagnostics_forwarded.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_contexts_created(&self) {
        self.contexts_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_contexts_reused(&self) {
        self.contexts_reused.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            renders_completed = self.renders_completed(),
            render_errors = self.render_errors(),
            diagnostics_forwarded = self.diagnostics_forwarded(),
            contexts_created = self.contexts_created(),
            contexts_reused = self.contexts_reused(),
        );
    }

    pub fn renders_completed(&self) -> u64 {
        self.renders_completed.load(Ordering::Relaxed)
    }

    pub fn render_errors(&self) -> u64 {
        self.render_errors.load(Ordering::Relaxed)
    }

    pub fn diagnostics_forwarded(&self) -> u64 {
        self.diagnostics_forwarded.load(Ordering::Relaxed)
    }

    pub fn contexts_created(&self) -> u64 {
        self.contexts_created.load(Ordering::Relaxed)
    }

    pub fn contexts_reused(&self) -> u64 {
        self.contexts_reused.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.renders_completed.store(0, Ordering::Relaxed);
        self.render_errors.store(0, Ordering::Relaxed);
        self.diagnostics_forwarded.store(0, Ordering::Relaxed);
        self.contexts_created.store(0, Ordering::Relaxed);
        self.contexts_reused.store(0, Ordering::Relaxed);
    }
}
