//! Script engine seam.
//!
//! The bridge only needs two capabilities from a JavaScript engine: seed a
//! fresh context with source, and evaluate an expression against it. Both take
//! an explicit timeout; a hang inside the script must not block the caller
//! forever when one is supplied.
//!
//! An engine holds one context at a time and is not shared between threads.
//! Concurrent renders need one engine each.

#[cfg(feature = "quickjs")]
pub mod quickjs;

use std::time::Duration;

#[cfg(feature = "quickjs")]
pub use quickjs::{EngineLimits, QuickJsEngine};

/// Errors reported by a [`ScriptEngine`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("no script context has been created")]
    NoContext,

    #[error("engine initialisation failed: {0}")]
    Init(String),

    #[error("uncaught exception: {0}")]
    Exception(String),

    #[error("evaluation exceeded {limit_ms}ms")]
    Timeout { limit_ms: u64 },

    #[error("expression did not produce a JSON-serialisable value")]
    NotSerializable,
}

/// An embeddable JavaScript engine.
pub trait ScriptEngine {
    /// Discard any current context and create a new one by evaluating `source`.
    fn create_context(&mut self, source: &str, timeout: Option<Duration>)
        -> Result<(), EngineError>;

    /// Evaluate `source` as an expression in the current context and return
    /// the JSON encoding of its value.
    fn eval_expression(
        &mut self,
        source: &str,
        timeout: Option<Duration>,
    ) -> Result<String, EngineError>;
}

impl<E: ScriptEngine + ?Sized> ScriptEngine for Box<E> {
    fn create_context(
        &mut self,
        source: &str,
        timeout: Option<Duration>,
    ) -> Result<(), EngineError> {
        (**self).create_context(source, timeout)
    }

    fn eval_expression(
        &mut self,
        source: &str,
        timeout: Option<Duration>,
    ) -> Result<String, EngineError> {
        (**self).eval_expression(source, timeout)
    }
}
