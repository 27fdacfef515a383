//! Render requests and the invocation script that drives the bundle.
//!
//! The generated script is a self-invoking function evaluated against a
//! context that already holds the polyfill and the bundle. It registers the
//! requested stores in order, then hands a request record to the bundle's
//! `serverRenderReactComponent` entry point and returns its result verbatim.
//!
//! Props payloads are pre-serialized JSON and are interpolated as-is. Names
//! and ids are emitted as JSON string literals.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Default name of the bundle's global render-orchestration object.
pub const DEFAULT_REGISTRY_GLOBAL: &str = "ReactOnRails";

/// One store to construct before rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInitializer {
    /// Name the bundle registered the store generator under.
    pub name: String,
    /// Pre-serialized JSON props for the generator.
    pub props: String,
}

impl StoreInitializer {
    pub fn new(name: impl Into<String>, props: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: props.into(),
        }
    }
}

/// Everything needed to render one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub component_name: String,
    /// Pre-serialized JSON props for the component.
    pub props: String,
    pub dom_node_id: String,
    /// Stores in registration order.
    #[serde(default)]
    pub stores: Vec<StoreInitializer>,
    pub trace: bool,
}

impl RenderRequest {
    pub fn new(
        component_name: impl Into<String>,
        props: impl Into<String>,
        dom_node_id: impl Into<String>,
        trace: bool,
    ) -> Self {
        Self {
            component_name: component_name.into(),
            props: props.into(),
            dom_node_id: dom_node_id.into(),
            stores: Vec::new(),
            trace,
        }
    }

    /// Append a store initializer; order of calls is registration order.
    pub fn with_store(mut self, name: impl Into<String>, props: impl Into<String>) -> Self {
        self.stores.push(StoreInitializer::new(name, props));
        self
    }

    pub fn with_stores(mut self, stores: impl IntoIterator<Item = StoreInitializer>) -> Self {
        self.stores.extend(stores);
        self
    }
}

/// Builds invocation scripts against a named registry global.
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    registry: String,
    reset_console: bool,
}

impl Default for InvocationBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_GLOBAL)
    }
}

impl InvocationBuilder {
    pub fn new(registry: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            reset_console: false,
        }
    }

    /// Clear `console.history` before rendering. Needed when a context is
    /// reused across renders.
    pub fn reset_console(mut self, reset: bool) -> Self {
        self.reset_console = reset;
        self
    }

    pub fn build(&self, request: &RenderRequest) -> String {
        let r = &self.registry;
        let mut js = String::from("(function() {\n");

        if self.reset_console {
            js.push_str("  console.history = [];\n");
        }

        if !request.stores.is_empty() {
            js.push_str("  var reduxProps, storeGenerator, store;\n");
        }
        for store in &request.stores {
            let name = js_string(&store.name);
            // Writing to a String cannot fail.
            let _ = write!(
                js,
                "  reduxProps = {props};\n  storeGenerator = {r}.getStoreGenerator({name});\n  store = storeGenerator(reduxProps);\n  {r}.setStore({name}, store);\n",
                props = store.props,
            );
        }

        let _ = write!(
            js,
            "  var props = {props};\n  return {r}.serverRenderReactComponent({{\n    name: {name},\n    domNodeId: {dom},\n    props: props,\n    trace: {trace},\n    location: ''\n  }});\n}})()",
            props = request.props,
            name = js_string(&request.component_name),
            dom = js_string(&request.dom_node_id),
            trace = request.trace,
        );
        js
    }
}

/// Build the invocation script with the default registry global.
pub fn build_invocation_script(request: &RenderRequest) -> String {
    InvocationBuilder::default().build(request)
}

/// `true` if `name` can be used verbatim as a JS global identifier.
pub fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RenderRequest {
        RenderRequest::new("HelloWorld", r#"{"name":"Ada"}"#, "hello-1", false)
    }

    #[test]
    fn test_script_without_stores() {
        let js = build_invocation_script(&request());
        assert!(js.starts_with("(function() {"));
        assert!(js.ends_with("})()"));
        assert!(!js.contains("getStoreGenerator"));
        assert!(!js.contains("console.history"));
        assert!(js.contains(r#"var props = {"name":"Ada"};"#));
        assert!(js.contains(r#"name: "HelloWorld","#));
        assert!(js.contains(r#"domNodeId: "hello-1","#));
        assert!(js.contains("trace: false,"));
        assert!(js.contains("location: ''"));
        assert!(js.contains("return ReactOnRails.serverRenderReactComponent({"));
    }

    #[test]
    fn test_stores_keep_caller_order() {
        let req = request()
            .with_store("zetaStore", r#"{"z":1}"#)
            .with_store("alphaStore", r#"{"a":2}"#);
        let js = build_invocation_script(&req);

        let zeta = js.find(r#"getStoreGenerator("zetaStore")"#).unwrap();
        let alpha = js.find(r#"getStoreGenerator("alphaStore")"#).unwrap();
        let props = js.find("var props").unwrap();
        assert!(zeta < alpha);
        assert!(alpha < props);
        assert!(js.contains(r#"reduxProps = {"z":1};"#));
        assert!(js.contains(r#"ReactOnRails.setStore("alphaStore", store);"#));
    }

    #[test]
    fn test_names_are_quoted_safely() {
        let req = RenderRequest::new("Evil'); alert(1); ('", "{}", "id\"x", true);
        let js = build_invocation_script(&req);
        assert!(js.contains(r#"name: "Evil'); alert(1); ('","#));
        assert!(js.contains(r#"domNodeId: "id\"x","#));
        assert!(js.contains("trace: true,"));
    }

    #[test]
    fn test_custom_registry_and_reset() {
        let js = InvocationBuilder::new("Registry")
            .reset_console(true)
            .build(&request().with_store("s", "{}"));
        assert!(js.contains("console.history = [];"));
        assert!(js.contains("Registry.getStoreGenerator"));
        assert!(js.contains("Registry.serverRenderReactComponent"));
        assert!(!js.contains("ReactOnRails"));
    }

    #[test]
    fn test_is_js_identifier() {
        assert!(is_js_identifier("ReactOnRails"));
        assert!(is_js_identifier("_r$1"));
        assert!(!is_js_identifier(""));
        assert!(!is_js_identifier("1abc"));
        assert!(!is_js_identifier("a.b"));
    }
}
