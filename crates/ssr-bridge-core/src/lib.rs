//! SSR Bridge Core Library
//!
//! Renders JavaScript UI components on the server by executing a pre-built
//! bundle inside an embedded script engine, then returns the markup together
//! with a replay of the console calls the bundle made.
//!
//! # Flow
//!
//! ```text
//! BundleLoader ──source──▶ ScriptEngine::create_context(polyfill + bundle)
//!                                   │
//! InvocationBuilder ──script──▶ ScriptEngine::eval_expression
//!                                   │
//!                         EvaluationResult {html, hasErrors, consoleReplay}
//!                                   │
//!                decode_replay ──▶ DiagnosticsSink / ServerRenderError
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ssr_bridge_core::{QuickJsEngine, RendererConfig, SsrRenderer};
//!
//! let config = RendererConfig::new("public/server-bundle.js");
//! let mut renderer = SsrRenderer::new(QuickJsEngine::new()?, config)?;
//! let markup = renderer.render("HelloWorld", r#"{"name":"Ada"}"#, "hello-1", &[], false)?;
//! ```

pub mod bundle;
pub mod config;
pub mod console;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod invocation;
pub mod metrics;
pub mod obs;
pub mod renderer;
pub mod telemetry;

pub use bundle::{BundleDigest, BundleLoader, FsBundleLoader, MemoryBundleLoader};
pub use config::{ContextPolicy, RendererConfig};
pub use console::{
    console_polyfill, decode_replay, encode_replay, encode_statement, extract_error_messages,
    ConsoleLevel, DiagnosticMessage, ReplayFraming, SERVER_MARKER,
};
pub use diagnostics::{DiagnosticsSink, MemorySink, TracingSink};
pub use engine::{EngineError, ScriptEngine};
#[cfg(feature = "quickjs")]
pub use engine::{EngineLimits, QuickJsEngine};
pub use error::{EvalPhase, Result, ServerRenderError, SsrError};
pub use invocation::{build_invocation_script, InvocationBuilder, RenderRequest, StoreInitializer};
pub use metrics::METRICS;
pub use obs::{
    emit_context_created, emit_render_failed, emit_render_finished, emit_render_started,
    RenderSpan,
};
pub use renderer::{EvaluationResult, RenderOutput, SsrRenderer};
pub use telemetry::init_tracing;

/// SSR bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
