//! Error taxonomy for the SSR bridge.

use std::fmt;
use std::path::PathBuf;

use crate::engine::EngineError;

/// Which evaluation step a script failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalPhase {
    /// Evaluating the console polyfill followed by the bundle source.
    Context,
    /// Evaluating the generated invocation script.
    Invocation,
}

impl fmt::Display for EvalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context => f.write_str("context"),
            Self::Invocation => f.write_str("invocation"),
        }
    }
}

/// Raised when the bundle reports `hasErrors` and fail-loud is configured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error rendering component {component}:\n{report}")]
pub struct ServerRenderError {
    /// Name of the component that failed to render.
    pub component: String,
    /// Extracted error diagnostics, newline-joined.
    pub report: String,
}

/// Errors produced by the SSR bridge.
#[derive(Debug, thiserror::Error)]
pub enum SsrError {
    #[error("server bundle not found in path: {}", path.display())]
    BundleNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("server bundle is empty: {}", path.display())]
    EmptyBundle { path: PathBuf },

    #[error("invalid renderer configuration: {0}")]
    InvalidConfig(String),

    #[error("script evaluation failed ({phase}): {source}")]
    ScriptEvaluation {
        phase: EvalPhase,
        #[source]
        source: EngineError,
    },

    #[error("render result is not a valid evaluation record: {0}")]
    InvalidResult(#[from] serde_json::Error),

    #[error(transparent)]
    ServerRender(#[from] ServerRenderError),
}

impl SsrError {
    /// `true` for failures caused by configuration rather than by the bundle.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::BundleNotFound { .. } | Self::EmptyBundle { .. } | Self::InvalidConfig(_)
        )
    }
}

/// Result type for SSR bridge operations.
pub type Result<T> = std::result::Result<T, SsrError>;
