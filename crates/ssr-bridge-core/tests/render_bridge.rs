//! Render bridge behaviour against a scripted engine.
//!
//! The scripted engine records every context source and invocation script it
//! receives and answers evaluations with a canned result, so these tests pin
//! down what the bridge sends to the engine and how it interprets replies.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ssr_bridge_core::{
    encode_replay, ConsoleLevel, ContextPolicy, DiagnosticMessage, EngineError, EvalPhase,
    MemoryBundleLoader, MemorySink, RenderRequest, RendererConfig, ScriptEngine, SsrError,
    SsrRenderer, StoreInitializer,
};
use tracing_test::traced_test;

const BUNDLE_PATH: &str = "/srv/app/server-bundle.js";
const BUNDLE: &str = "var ReactOnRails = { serverRenderReactComponent: function () {} };";

// -------------------------------------------------------------------------
// Scripted engine
// -------------------------------------------------------------------------

#[derive(Debug, Default)]
struct EngineLog {
    contexts: Vec<String>,
    scripts: Vec<String>,
    timeouts: Vec<Option<Duration>>,
}

#[derive(Clone)]
struct ScriptedEngine {
    log: Arc<Mutex<EngineLog>>,
    reply: Result<String, EngineError>,
    context_error: Option<EngineError>,
}

impl ScriptedEngine {
    fn replying(reply: serde_json::Value) -> Self {
        Self {
            log: Arc::new(Mutex::new(EngineLog::default())),
            reply: Ok(reply.to_string()),
            context_error: None,
        }
    }

    fn contexts(&self) -> Vec<String> {
        self.log.lock().unwrap().contexts.clone()
    }

    fn scripts(&self) -> Vec<String> {
        self.log.lock().unwrap().scripts.clone()
    }
}

impl ScriptEngine for ScriptedEngine {
    fn create_context(
        &mut self,
        source: &str,
        timeout: Option<Duration>,
    ) -> Result<(), EngineError> {
        let mut log = self.log.lock().unwrap();
        log.contexts.push(source.to_string());
        log.timeouts.push(timeout);
        match &self.context_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn eval_expression(
        &mut self,
        source: &str,
        timeout: Option<Duration>,
    ) -> Result<String, EngineError> {
        let mut log = self.log.lock().unwrap();
        log.scripts.push(source.to_string());
        log.timeouts.push(timeout);
        self.reply.clone()
    }
}

fn reply(html: &str, has_errors: bool, replay: &str) -> serde_json::Value {
    serde_json::json!({ "html": html, "hasErrors": has_errors, "consoleReplay": replay })
}

fn mixed_replay() -> String {
    encode_replay(&[
        DiagnosticMessage::new(ConsoleLevel::Log, "rendering HelloWorld"),
        DiagnosticMessage::error("Warning: Each child in a list should have a unique \"key\""),
        DiagnosticMessage::new(ConsoleLevel::Warn, "deprecated prop"),
        DiagnosticMessage::error("Cannot read properties of undefined"),
    ])
}

fn renderer(
    engine: ScriptedEngine,
    config: RendererConfig,
) -> (SsrRenderer<ScriptedEngine>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let renderer = SsrRenderer::new(engine, config)
        .unwrap()
        .with_loader(MemoryBundleLoader::new().with_bundle(BUNDLE_PATH, BUNDLE))
        .with_sink(sink.clone());
    (renderer, sink)
}

// -------------------------------------------------------------------------
// Successful renders
// -------------------------------------------------------------------------

#[test]
fn test_clean_render_returns_html_then_replay() {
    let replay = encode_replay(&[DiagnosticMessage::new(ConsoleLevel::Log, "hello")]);
    let engine = ScriptedEngine::replying(reply("<div>Hello Ada</div>", false, &replay));
    let (mut r, sink) = renderer(engine, RendererConfig::new(BUNDLE_PATH));

    let markup = r
        .render("HelloWorld", r#"{"name":"Ada"}"#, "hello-1", &[], false)
        .unwrap();

    assert_eq!(markup, format!("<div>Hello Ada</div>{replay}"));
    assert!(sink.messages().is_empty());
}

#[test]
fn test_context_is_polyfill_then_bundle() {
    let engine = ScriptedEngine::replying(reply("<p/>", false, ""));
    let (mut r, _) = renderer(engine.clone(), RendererConfig::new(BUNDLE_PATH));

    r.render("HelloWorld", "{}", "hello-1", &[], false).unwrap();

    let contexts = engine.contexts();
    assert_eq!(contexts.len(), 1);
    let polyfill_at = contexts[0].find("var console = { history: [] };").unwrap();
    let bundle_at = contexts[0].find(BUNDLE).unwrap();
    assert!(polyfill_at < bundle_at);
    assert!(contexts[0].ends_with(BUNDLE));
}

#[test]
fn test_invocation_script_carries_request() {
    let engine = ScriptedEngine::replying(reply("<p/>", false, ""));
    let (mut r, _) = renderer(engine.clone(), RendererConfig::new(BUNDLE_PATH));

    r.render("HelloWorld", r#"{"name":"Ada"}"#, "hello-1", &[], true)
        .unwrap();

    let scripts = engine.scripts();
    assert_eq!(scripts.len(), 1);
    let js = &scripts[0];
    assert!(js.contains(r#"var props = {"name":"Ada"};"#));
    assert!(js.contains(r#"name: "HelloWorld","#));
    assert!(js.contains(r#"domNodeId: "hello-1","#));
    assert!(js.contains("trace: true,"));
    assert!(!js.contains("getStoreGenerator"));
}

#[test]
fn test_stores_registered_in_supplied_order() {
    let engine = ScriptedEngine::replying(reply("<p/>", false, ""));
    let (mut r, _) = renderer(engine.clone(), RendererConfig::new(BUNDLE_PATH));

    let stores = [
        StoreInitializer::new("sessionStore", r#"{"user":null}"#),
        StoreInitializer::new("cartStore", r#"{"items":[]}"#),
        StoreInitializer::new("appStore", r#"{"ready":true}"#),
    ];
    r.render("App", "{}", "app-1", &stores, false).unwrap();

    let js = &engine.scripts()[0];
    let positions: Vec<usize> = ["sessionStore", "cartStore", "appStore"]
        .iter()
        .map(|name| js.find(&format!("getStoreGenerator(\"{name}\")")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(js.contains(r#"reduxProps = {"items":[]};"#));
}

#[test]
fn test_renders_are_idempotent_and_recreate_context() {
    let engine = ScriptedEngine::replying(reply("<p>same</p>", false, &mixed_replay()));
    let (mut r, _) = renderer(engine.clone(), RendererConfig::new(BUNDLE_PATH));

    let request = RenderRequest::new("HelloWorld", "{}", "hello-1", false);
    let first = r.render_request(&request).unwrap();
    let second = r.render_request(&request).unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.contexts().len(), 2);
    assert_eq!(engine.scripts()[0], engine.scripts()[1]);
}

#[test]
fn test_timeout_is_passed_to_engine() {
    let engine = ScriptedEngine::replying(reply("<p/>", false, ""));
    let config = RendererConfig::new(BUNDLE_PATH).with_timeout_ms(Some(250));
    let (mut r, _) = renderer(engine.clone(), config);

    r.render("HelloWorld", "{}", "hello-1", &[], false).unwrap();

    let timeouts = engine.log.lock().unwrap().timeouts.clone();
    assert_eq!(timeouts, vec![Some(Duration::from_millis(250)); 2]);
}

#[test]
fn test_detailed_output_decodes_all_levels() {
    let engine = ScriptedEngine::replying(reply("<p/>", false, &mixed_replay()));
    let (mut r, sink) = renderer(engine, RendererConfig::new(BUNDLE_PATH));

    let out = r
        .render_detailed(&RenderRequest::new("HelloWorld", "{}", "hello-1", false))
        .unwrap();

    assert_eq!(out.diagnostics.len(), 4);
    assert_eq!(out.error_messages().len(), 2);
    // Without hasErrors nothing is forwarded.
    assert!(sink.messages().is_empty());
}

// -------------------------------------------------------------------------
// Failure policy
// -------------------------------------------------------------------------

#[test]
fn test_has_errors_fail_soft_warns_and_returns_markup() {
    let replay = mixed_replay();
    let engine = ScriptedEngine::replying(reply("<div></div>", true, &replay));
    let (mut r, sink) = renderer(engine, RendererConfig::new(BUNDLE_PATH));

    let markup = r.render("HelloWorld", "{}", "hello-1", &[], false).unwrap();

    assert_eq!(markup, format!("<div></div>{replay}"));
    assert_eq!(
        sink.messages(),
        vec![
            "Warning: Each child in a list should have a unique \"key\"",
            "Cannot read properties of undefined",
        ]
    );
}

#[test]
fn test_has_errors_fail_loud_raises_server_render_error() {
    let engine = ScriptedEngine::replying(reply("<div></div>", true, &mixed_replay()));
    let config = RendererConfig::new(BUNDLE_PATH).with_fail_loud(true);
    let (mut r, sink) = renderer(engine, config);

    let err = r
        .render("HelloWorld", "{}", "hello-1", &[], false)
        .unwrap_err();

    match err {
        SsrError::ServerRender(e) => {
            assert_eq!(e.component, "HelloWorld");
            assert_eq!(
                e.report,
                "Warning: Each child in a list should have a unique \"key\"\nCannot read properties of undefined"
            );
        }
        other => panic!("expected ServerRender, got {:?}", other),
    }
    // Diagnostics are logged before escalating.
    assert_eq!(sink.messages().len(), 2);
}

#[test]
fn test_fail_loud_can_be_toggled_between_renders() {
    let engine = ScriptedEngine::replying(reply("<i/>", true, &mixed_replay()));
    let (mut r, _) = renderer(engine, RendererConfig::new(BUNDLE_PATH));

    assert!(r.render("A", "{}", "a", &[], false).is_ok());
    r.set_fail_loud(true);
    assert!(matches!(
        r.render("A", "{}", "a", &[], false),
        Err(SsrError::ServerRender(_))
    ));
}

#[test]
fn test_fail_loud_ignored_without_has_errors() {
    let engine = ScriptedEngine::replying(reply("<p/>", false, &mixed_replay()));
    let config = RendererConfig::new(BUNDLE_PATH).with_fail_loud(true);
    let (mut r, sink) = renderer(engine, config);

    assert!(r.render("HelloWorld", "{}", "hello-1", &[], false).is_ok());
    assert!(sink.messages().is_empty());
}

// -------------------------------------------------------------------------
// Configuration and evaluation errors
// -------------------------------------------------------------------------

#[test]
fn test_missing_bundle_fails_before_any_evaluation() {
    let engine = ScriptedEngine::replying(reply("<p/>", false, ""));
    let config = RendererConfig::new("/srv/app/missing.js");
    let (mut r, _) = renderer(engine.clone(), config);

    let err = r.render("HelloWorld", "{}", "hello-1", &[], false).unwrap_err();

    assert!(matches!(err, SsrError::BundleNotFound { .. }));
    assert!(err.is_configuration());
    assert!(engine.contexts().is_empty());
    assert!(engine.scripts().is_empty());
}

#[test]
fn test_context_failure_is_script_evaluation_error() {
    let mut engine = ScriptedEngine::replying(reply("<p/>", false, ""));
    engine.context_error = Some(EngineError::Exception("SyntaxError: unexpected token".into()));
    let (mut r, _) = renderer(engine.clone(), RendererConfig::new(BUNDLE_PATH));

    let err = r.render("HelloWorld", "{}", "hello-1", &[], false).unwrap_err();

    match err {
        SsrError::ScriptEvaluation { phase, source } => {
            assert_eq!(phase, EvalPhase::Context);
            assert!(source.to_string().contains("SyntaxError"));
        }
        other => panic!("expected ScriptEvaluation, got {:?}", other),
    }
    assert!(engine.scripts().is_empty());
}

#[test]
fn test_invocation_failure_is_script_evaluation_error() {
    let mut engine = ScriptedEngine::replying(reply("<p/>", false, ""));
    engine.reply = Err(EngineError::Timeout { limit_ms: 30_000 });
    let (mut r, _) = renderer(engine, RendererConfig::new(BUNDLE_PATH));

    match r.render("HelloWorld", "{}", "hello-1", &[], false) {
        Err(SsrError::ScriptEvaluation {
            phase: EvalPhase::Invocation,
            source: EngineError::Timeout { limit_ms },
        }) => assert_eq!(limit_ms, 30_000),
        other => panic!("expected invocation timeout, got {:?}", other),
    }
}

#[test]
fn test_malformed_result_is_rejected() {
    let engine = ScriptedEngine::replying(serde_json::json!({ "markup": "<p/>" }));
    let (mut r, _) = renderer(engine, RendererConfig::new(BUNDLE_PATH));

    let err = r.render("HelloWorld", "{}", "hello-1", &[], false).unwrap_err();
    assert!(matches!(err, SsrError::InvalidResult(_)));
}

#[test]
fn test_legacy_replay_key_is_accepted() {
    let replay = encode_replay(&[DiagnosticMessage::error("legacy")]);
    let engine = ScriptedEngine::replying(serde_json::json!({
        "html": "<p/>",
        "hasErrors": true,
        "consoleReplayScript": replay,
    }));
    let (mut r, sink) = renderer(engine, RendererConfig::new(BUNDLE_PATH));

    let markup = r.render("HelloWorld", "{}", "hello-1", &[], false).unwrap();
    assert_eq!(markup, format!("<p/>{replay}"));
    assert_eq!(sink.messages(), vec!["legacy"]);
}

#[test]
fn test_result_serialized_as_json_text_is_accepted() {
    // ReactOnRails returns JSON.stringify(result) rather than the object.
    let replay = encode_replay(&[DiagnosticMessage::error("stringified")]);
    let record = serde_json::json!({
        "html": "<p/>",
        "hasErrors": true,
        "consoleReplayScript": replay,
    });
    let engine = ScriptedEngine::replying(serde_json::Value::String(record.to_string()));
    let (mut r, sink) = renderer(engine, RendererConfig::new(BUNDLE_PATH));

    let markup = r.render("HelloWorld", "{}", "hello-1", &[], false).unwrap();
    assert_eq!(markup, format!("<p/>{replay}"));
    assert_eq!(sink.messages(), vec!["stringified"]);
}

#[test]
fn test_formatted_error_call_reaches_sink_and_report() {
    let replay = [
        "",
        r#"<script id="consoleReplayLog">"#,
        r#"console.error.apply(console, ["[SERVER] Warning: Failed prop type: %s", "name is required"]);"#,
        "</script>",
        "",
    ]
    .join("\n");
    let engine = ScriptedEngine::replying(reply("", true, &replay));
    let (mut r, sink) = renderer(engine.clone(), RendererConfig::new(BUNDLE_PATH));

    r.render("HelloWorld", "{}", "hello-1", &[], false).unwrap();
    assert_eq!(
        sink.messages(),
        vec!["Warning: Failed prop type: name is required"]
    );

    r.set_fail_loud(true);
    match r.render("HelloWorld", "{}", "hello-1", &[], false) {
        Err(SsrError::ServerRender(e)) => {
            assert_eq!(e.report, "Warning: Failed prop type: name is required")
        }
        other => panic!("expected ServerRender, got {:?}", other),
    }
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let engine = ScriptedEngine::replying(reply("<p/>", false, ""));
    let config = RendererConfig::new(BUNDLE_PATH).with_registry_global("not valid");
    assert!(matches!(
        SsrRenderer::new(engine, config),
        Err(SsrError::InvalidConfig(_))
    ));
}

// -------------------------------------------------------------------------
// Context reuse
// -------------------------------------------------------------------------

#[test]
fn test_reuse_policy_keeps_context_and_resets_history() {
    let engine = ScriptedEngine::replying(reply("<p/>", false, ""));
    let config = RendererConfig::new(BUNDLE_PATH).with_context_policy(ContextPolicy::Reuse);
    let (mut r, _) = renderer(engine.clone(), config);

    r.render("A", "{}", "a", &[], false).unwrap();
    r.render("A", "{}", "a", &[], false).unwrap();

    assert_eq!(engine.contexts().len(), 1);
    let scripts = engine.scripts();
    assert!(!scripts[0].contains("console.history = [];"));
    assert!(scripts[1].contains("console.history = [];"));
}

#[test]
fn test_reuse_policy_reloads_changed_bundle() {
    let engine = ScriptedEngine::replying(reply("<p/>", false, ""));
    let loader = Arc::new(MemoryBundleLoader::new().with_bundle(BUNDLE_PATH, BUNDLE));
    let config = RendererConfig::new(BUNDLE_PATH).with_context_policy(ContextPolicy::Reuse);
    let mut r = SsrRenderer::new(engine.clone(), config)
        .unwrap()
        .with_loader(loader.clone());

    r.render("A", "{}", "a", &[], false).unwrap();
    loader.insert(BUNDLE_PATH, "var ReactOnRails = { v: 2 };");
    r.render("A", "{}", "a", &[], false).unwrap();

    let contexts = engine.contexts();
    assert_eq!(contexts.len(), 2);
    assert!(contexts[1].ends_with("var ReactOnRails = { v: 2 };"));
}

#[test]
fn test_set_bundle_path_switches_bundle() {
    let engine = ScriptedEngine::replying(reply("<p/>", false, ""));
    let loader = MemoryBundleLoader::new()
        .with_bundle(BUNDLE_PATH, BUNDLE)
        .with_bundle("/srv/app/next-bundle.js", "var ReactOnRails = { next: true };");
    let config = RendererConfig::new(BUNDLE_PATH).with_context_policy(ContextPolicy::Reuse);
    let mut r = SsrRenderer::new(engine.clone(), config)
        .unwrap()
        .with_loader(loader);

    r.render("A", "{}", "a", &[], false).unwrap();
    r.set_bundle_path("/srv/app/next-bundle.js");
    assert_eq!(r.bundle_path(), Path::new("/srv/app/next-bundle.js"));
    r.render("A", "{}", "a", &[], false).unwrap();

    let contexts = engine.contexts();
    assert_eq!(contexts.len(), 2);
    assert!(contexts[1].ends_with("var ReactOnRails = { next: true };"));
}

// -------------------------------------------------------------------------
// Default sink
// -------------------------------------------------------------------------

#[traced_test]
#[test]
fn test_default_sink_logs_warnings() {
    let replay = encode_replay(&[DiagnosticMessage::error("store generator missing")]);
    let engine = ScriptedEngine::replying(reply("", true, &replay));
    let mut r = SsrRenderer::new(engine, RendererConfig::new(BUNDLE_PATH))
        .unwrap()
        .with_loader(MemoryBundleLoader::new().with_bundle(BUNDLE_PATH, BUNDLE));

    r.render("HelloWorld", "{}", "hello-1", &[], false).unwrap();

    assert!(logs_contain("store generator missing"));
    assert!(logs_contain("render.diagnostic"));
    assert!(logs_contain("component=HelloWorld"));
    assert!(logs_contain("render.finished"));
}
