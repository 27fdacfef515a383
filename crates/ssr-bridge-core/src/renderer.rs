//! The render bridge: load the bundle, seed a context, evaluate the
//! invocation script, interpret the result, and apply the failure policy.
//!
//! A renderer owns one engine and is driven by one caller at a time. Hosts
//! that render concurrently need one renderer per worker.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::bundle::{BundleDigest, BundleLoader, FsBundleLoader};
use crate::config::{ContextPolicy, RendererConfig};
use crate::console::{context_source, decode_replay, DiagnosticMessage};
use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::engine::ScriptEngine;
use crate::error::{EvalPhase, Result, ServerRenderError, SsrError};
use crate::invocation::{InvocationBuilder, RenderRequest, StoreInitializer};
use crate::metrics::METRICS;
use crate::obs::{
    emit_context_created, emit_render_failed, emit_render_finished, emit_render_started,
    RenderSpan,
};

/// The record returned by the bundle's render entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(rename = "hasErrors")]
    pub has_errors: bool,
    pub html: String,
    #[serde(rename = "consoleReplay", alias = "consoleReplayScript", default)]
    pub console_replay: String,
}

impl EvaluationResult {
    /// Parse the engine's raw reply.
    ///
    /// The entry point may return the record itself or the record already
    /// serialized as JSON text, which arrives here as a JSON string.
    pub fn from_reply(raw: &str) -> Result<Self> {
        match serde_json::from_str::<serde_json::Value>(raw)? {
            serde_json::Value::String(text) => Ok(serde_json::from_str(&text)?),
            value => Ok(serde_json::from_value(value)?),
        }
    }
}

/// Outcome of a render that produced markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub html: String,
    /// Replay text exactly as the bundle produced it.
    pub console_replay: String,
    pub has_errors: bool,
    /// Every server-tagged console call found in the replay.
    pub diagnostics: Vec<DiagnosticMessage>,
}

impl RenderOutput {
    /// Markup for the response body: the HTML followed by the replay.
    pub fn into_markup(self) -> String {
        let mut markup = self.html;
        markup.push_str(&self.console_replay);
        markup
    }

    pub fn error_messages(&self) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.text.as_str())
            .collect()
    }
}

/// Bundle currently evaluated in the engine's context.
#[derive(Debug, Clone, PartialEq)]
struct LoadedBundle {
    path: PathBuf,
    digest: BundleDigest,
}

/// Server-side renderer over a [`ScriptEngine`].
pub struct SsrRenderer<E: ScriptEngine> {
    engine: E,
    config: RendererConfig,
    loader: Box<dyn BundleLoader>,
    sink: Arc<dyn DiagnosticsSink>,
    loaded: Option<LoadedBundle>,
}

impl<E: ScriptEngine> SsrRenderer<E> {
    /// Create a renderer reading bundles from disk and reporting through `tracing`.
    pub fn new(engine: E, config: RendererConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            config,
            loader: Box::new(FsBundleLoader),
            sink: Arc::new(TracingSink),
            loaded: None,
        })
    }

    pub fn with_loader(mut self, loader: impl BundleLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self.loaded = None;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn bundle_path(&self) -> &Path {
        &self.config.bundle_path
    }

    /// Point subsequent renders at a different bundle.
    ///
    /// Must not be called while a render is in flight on another thread;
    /// the renderer provides no locking.
    pub fn set_bundle_path(&mut self, path: impl Into<PathBuf>) {
        self.config.bundle_path = path.into();
        self.loaded = None;
    }

    pub fn set_fail_loud(&mut self, fail_loud: bool) {
        self.config.fail_loud = fail_loud;
    }

    /// Render a component and return `html + consoleReplay`.
    pub fn render(
        &mut self,
        component_name: &str,
        props: &str,
        dom_node_id: &str,
        stores: &[StoreInitializer],
        trace: bool,
    ) -> Result<String> {
        let request = RenderRequest::new(component_name, props, dom_node_id, trace)
            .with_stores(stores.iter().cloned());
        self.render_request(&request)
    }

    pub fn render_request(&mut self, request: &RenderRequest) -> Result<String> {
        self.render_detailed(request).map(RenderOutput::into_markup)
    }

    /// Render and return the structured outcome.
    pub fn render_detailed(&mut self, request: &RenderRequest) -> Result<RenderOutput> {
        let _span = RenderSpan::enter(&request.component_name, &request.dom_node_id);
        emit_render_started(&request.component_name, request.stores.len(), request.trace);
        let started = Instant::now();

        let outcome = self.run(request);
        match &outcome {
            Ok(output) => emit_render_finished(
                &request.component_name,
                started.elapsed().as_millis() as u64,
                output.has_errors,
                output.diagnostics.len(),
            ),
            Err(err) => emit_render_failed(&request.component_name, err),
        }
        outcome
    }

    fn run(&mut self, request: &RenderRequest) -> Result<RenderOutput> {
        let reused = self.prepare_context()?;

        let script = InvocationBuilder::new(self.config.registry_global.as_str())
            .reset_console(reused)
            .build(request);
        tracing::debug!(bytes = script.len(), "evaluating invocation script");

        let raw = self
            .engine
            .eval_expression(&script, self.config.timeout())
            .map_err(|source| {
                self.loaded = None;
                SsrError::ScriptEvaluation {
                    phase: EvalPhase::Invocation,
                    source,
                }
            })?;
        let result = EvaluationResult::from_reply(&raw)?;

        let diagnostics = decode_replay(&result.console_replay, &self.config.replay_framing);
        let output = RenderOutput {
            html: result.html,
            console_replay: result.console_replay,
            has_errors: result.has_errors,
            diagnostics,
        };

        if output.has_errors {
            METRICS.inc_render_errors();
            let errors = output.error_messages();
            for line in &errors {
                self.sink.warn_for(&request.component_name, line);
            }
            METRICS.add_diagnostics(errors.len() as u64);

            if self.config.fail_loud {
                return Err(ServerRenderError {
                    component: request.component_name.clone(),
                    report: errors.join("\n"),
                }
                .into());
            }
        }

        METRICS.inc_renders();
        Ok(output)
    }

    /// Make sure the engine holds a context with the current bundle.
    /// Returns `true` when an existing context was reused.
    fn prepare_context(&mut self) -> Result<bool> {
        let path = self.config.bundle_path.clone();
        let source = self.loader.load(&path)?;
        let digest = BundleDigest::compute(&source);
        let wanted = LoadedBundle { path, digest };

        let policy = self.config.context_policy;
        if policy == ContextPolicy::Reuse && self.loaded.as_ref() == Some(&wanted) {
            METRICS.inc_contexts_reused();
            emit_context_created(&wanted.path.display().to_string(), &digest, true);
            return Ok(true);
        }

        self.loaded = None;
        self.engine
            .create_context(&context_source(&source), self.config.timeout())
            .map_err(|source| SsrError::ScriptEvaluation {
                phase: EvalPhase::Context,
                source,
            })?;
        METRICS.inc_contexts_created();
        emit_context_created(&wanted.path.display().to_string(), &digest, false);

        if policy == ContextPolicy::Reuse {
            self.loaded = Some(wanted);
        }
        Ok(false)
    }
}
