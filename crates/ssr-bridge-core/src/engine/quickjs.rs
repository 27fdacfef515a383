//! QuickJS-backed [`ScriptEngine`] via `rquickjs`.

use std::time::{Duration, Instant};

use rquickjs::{CatchResultExt, Context, Runtime, Value};
use serde::{Deserialize, Serialize};

use super::{EngineError, ScriptEngine};

/// Resource limits applied to the QuickJS runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLimits {
    /// Heap limit for the runtime (`None` = unlimited).
    pub memory_limit_bytes: Option<usize>,
    /// Native stack limit for script execution.
    pub max_stack_bytes: Option<usize>,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            memory_limit_bytes: None,
            max_stack_bytes: Some(5 * 1024 * 1024),
        }
    }
}

/// Embedded QuickJS engine holding at most one context.
pub struct QuickJsEngine {
    context: Option<Context>,
    runtime: Runtime,
}

impl QuickJsEngine {
    pub fn new() -> Result<Self, EngineError> {
        Self::with_limits(&EngineLimits::default())
    }

    pub fn with_limits(limits: &EngineLimits) -> Result<Self, EngineError> {
        let runtime = Runtime::new().map_err(|e| EngineError::Init(e.to_string()))?;
        if let Some(bytes) = limits.memory_limit_bytes {
            runtime.set_memory_limit(bytes);
        }
        if let Some(bytes) = limits.max_stack_bytes {
            runtime.set_max_stack_size(bytes);
        }
        Ok(Self {
            context: None,
            runtime,
        })
    }

    /// Install an interrupt handler that fires once `timeout` has elapsed.
    fn arm(&self, timeout: Option<Duration>) -> Option<Instant> {
        let deadline = timeout.map(|t| Instant::now() + t);
        match deadline {
            Some(deadline) => self
                .runtime
                .set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline))),
            None => self.runtime.set_interrupt_handler(None),
        }
        deadline
    }

    fn disarm(&self) {
        self.runtime.set_interrupt_handler(None);
    }
}

fn classify(message: String, deadline: Option<Instant>, timeout: Option<Duration>) -> EngineError {
    match (deadline, timeout) {
        (Some(deadline), Some(timeout)) if Instant::now() >= deadline => EngineError::Timeout {
            limit_ms: timeout.as_millis() as u64,
        },
        _ => EngineError::Exception(message),
    }
}

impl ScriptEngine for QuickJsEngine {
    fn create_context(
        &mut self,
        source: &str,
        timeout: Option<Duration>,
    ) -> Result<(), EngineError> {
        self.context = None;
        let context = Context::full(&self.runtime).map_err(|e| EngineError::Init(e.to_string()))?;

        let deadline = self.arm(timeout);
        let outcome = context.with(|ctx| {
            ctx.eval::<Value, _>(source)
                .catch(&ctx)
                .map(|_| ())
                .map_err(|e| e.to_string())
        });
        self.disarm();

        outcome.map_err(|msg| classify(msg, deadline, timeout))?;
        self.context = Some(context);
        Ok(())
    }

    fn eval_expression(
        &mut self,
        source: &str,
        timeout: Option<Duration>,
    ) -> Result<String, EngineError> {
        let context = self.context.as_ref().ok_or(EngineError::NoContext)?;
        let wrapped = format!("JSON.stringify({source})");

        let deadline = self.arm(timeout);
        let outcome = context.with(|ctx| {
            ctx.eval::<Option<String>, _>(wrapped)
                .catch(&ctx)
                .map_err(|e| e.to_string())
        });
        self.disarm();

        outcome
            .map_err(|msg| classify(msg, deadline, timeout))?
            .ok_or(EngineError::NotSerializable)
    }
}
