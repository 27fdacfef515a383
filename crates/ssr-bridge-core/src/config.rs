//! Renderer configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::console::ReplayFraming;
use crate::error::{Result, SsrError};
use crate::invocation::{is_js_identifier, DEFAULT_REGISTRY_GLOBAL};

/// Whether the script context survives between renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextPolicy {
    /// Re-evaluate polyfill and bundle on every render.
    #[default]
    Fresh,
    /// Keep the context while the bundle path and content are unchanged.
    Reuse,
}

impl std::str::FromStr for ContextPolicy {
    type Err = SsrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fresh" => Ok(Self::Fresh),
            "reuse" => Ok(Self::Reuse),
            other => Err(SsrError::InvalidConfig(format!(
                "unknown context policy: {other}"
            ))),
        }
    }
}

/// Configuration for an [`crate::SsrRenderer`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RendererConfig {
    /// Path of the server bundle. May be swapped between renders.
    pub bundle_path: PathBuf,
    /// Escalate bundle-reported render errors to [`crate::ServerRenderError`].
    pub fail_loud: bool,
    /// Wall-clock limit per script evaluation (milliseconds, `None` = unbounded).
    pub timeout_ms: Option<u64>,
    pub context_policy: ContextPolicy,
    pub replay_framing: ReplayFraming,
    /// Global object the bundle exposes its render entry points on.
    pub registry_global: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            bundle_path: PathBuf::new(),
            fail_loud: false,
            timeout_ms: Some(30_000),
            context_policy: ContextPolicy::Fresh,
            replay_framing: ReplayFraming::default(),
            registry_global: DEFAULT_REGISTRY_GLOBAL.to_string(),
        }
    }
}

impl RendererConfig {
    pub fn new(bundle_path: impl Into<PathBuf>) -> Self {
        Self {
            bundle_path: bundle_path.into(),
            ..Self::default()
        }
    }

    pub fn with_fail_loud(mut self, fail_loud: bool) -> Self {
        self.fail_loud = fail_loud;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_context_policy(mut self, policy: ContextPolicy) -> Self {
        self.context_policy = policy;
        self
    }

    pub fn with_replay_framing(mut self, framing: ReplayFraming) -> Self {
        self.replay_framing = framing;
        self
    }

    pub fn with_registry_global(mut self, name: impl Into<String>) -> Self {
        self.registry_global = name.into();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - SSR_BUNDLE_PATH (required)
    /// - SSR_FAIL_LOUD (optional, default: "false")
    /// - SSR_TIMEOUT_MS (optional, default: 30000; "0" disables the limit)
    /// - SSR_CONTEXT_POLICY (optional, "fresh" or "reuse", default: "fresh")
    /// - SSR_REGISTRY_GLOBAL (optional, default: "ReactOnRails")
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RendererConfig::from_env`] with an explicit variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bundle_path = lookup("SSR_BUNDLE_PATH")
            .ok_or_else(|| SsrError::InvalidConfig("SSR_BUNDLE_PATH not set".into()))?;
        let mut config = Self::new(bundle_path);

        if let Some(v) = lookup("SSR_FAIL_LOUD") {
            config.fail_loud = v.to_lowercase() == "true";
        }
        if let Some(v) = lookup("SSR_TIMEOUT_MS") {
            let ms: u64 = v.trim().parse().map_err(|_| {
                SsrError::InvalidConfig(format!("SSR_TIMEOUT_MS is not a number: {v}"))
            })?;
            config.timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(v) = lookup("SSR_CONTEXT_POLICY") {
            config.context_policy = v.parse()?;
        }
        if let Some(v) = lookup("SSR_REGISTRY_GLOBAL") {
            config.registry_global = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that can never render.
    pub fn validate(&self) -> Result<()> {
        if self.bundle_path.as_os_str().is_empty() {
            return Err(SsrError::InvalidConfig("bundle path is empty".into()));
        }
        if !is_js_identifier(&self.registry_global) {
            return Err(SsrError::InvalidConfig(format!(
                "registry global is not a JavaScript identifier: {}",
                self.registry_global
            )));
        }
        Ok(())
    }
}
