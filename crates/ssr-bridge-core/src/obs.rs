//! Structured observability hooks for render lifecycle events.
//!
//! This module provides:
//! - Render-scoped tracing spans via the `RenderSpan` RAII guard
//! - Emission functions for render start, finish, failure, and context creation
//!
//! Events are emitted at `info!` level; failures at `warn!`.

use tracing::info;

use crate::bundle::BundleDigest;

/// RAII guard that enters a render-scoped tracing span.
///
/// # Example
///
/// ```ignore
/// let _span = RenderSpan::enter("HelloWorld", "hello-1");
/// // tracing calls now carry component = "HelloWorld", dom_node_id = "hello-1"
/// ```
pub struct RenderSpan {
    _span: tracing::span::EnteredSpan,
}

impl RenderSpan {
    pub fn enter(component: &str, dom_node_id: &str) -> Self {
        let span = tracing::info_span!("ssr.render", component = %component, dom_node_id = %dom_node_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: render started.
pub fn emit_render_started(component: &str, stores: usize, trace: bool) {
    info!(event = "render.started", component = %component, stores = stores, trace = trace);
}

/// Emit event: render finished with duration, error flag, and diagnostics count.
pub fn emit_render_finished(component: &str, duration_ms: u64, has_errors: bool, diagnostics: usize) {
    info!(
        event = "render.finished",
        component = %component,
        duration_ms = duration_ms,
        has_errors = has_errors,
        diagnostics = diagnostics,
    );
}

/// Emit event: render aborted with an error (warning level).
pub fn emit_render_failed(component: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "render.failed", component = %component, error = %error);
}

/// Emit event: script context created or reused.
pub fn emit_context_created(bundle_path: &str, digest: &BundleDigest, reused: bool) {
    info!(
        event = "context.created",
        bundle_path = %bundle_path,
        bundle_digest = %digest.short(),
        reused = reused,
    );
}
