//! The console replay grammar: levels, the server marker, and the encoder.
//!
//! A replay is a block of JavaScript statements, one per line, wrapped in a
//! two-line header and a two-line footer:
//!
//! ```text
//!
//! <script id="consoleReplayLog">
//! console.error.apply(console, ["[SERVER] something broke"]);
//! console.log.apply(console, ["[SERVER] rendered"]);
//! </script>
//!
//! ```
//!
//! The decoder in [`super::decode`] is the inverse of [`encode_replay`]; the
//! two must change together.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix the polyfill adds to the first argument of every console call.
pub const SERVER_MARKER: &str = "[SERVER] ";

/// Opening line of the replay envelope.
pub const REPLAY_OPEN: &str = "<script id=\"consoleReplayLog\">";

/// Closing line of the replay envelope.
pub const REPLAY_CLOSE: &str = "</script>";

/// Console levels the polyfill provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Error,
    Warn,
    Info,
    Log,
}

impl ConsoleLevel {
    pub const ALL: [ConsoleLevel; 4] = [Self::Error, Self::Log, Self::Info, Self::Warn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Log => "log",
        }
    }
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsoleLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "log" => Ok(Self::Log),
            other => Err(format!("unknown console level: {other}")),
        }
    }
}

/// One server-originated console call recovered from a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    pub level: ConsoleLevel,
    /// Message text with the server marker removed.
    pub text: String,
}

impl DiagnosticMessage {
    pub fn new(level: ConsoleLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Error, text)
    }

    pub fn is_error(&self) -> bool {
        self.level == ConsoleLevel::Error
    }
}

/// Encode a single replay statement for a server-tagged call.
///
/// The argument list holds one JSON string literal, so the statement always
/// fits on one line regardless of the message content.
pub fn encode_statement(level: ConsoleLevel, text: &str) -> String {
    let args = serde_json::json!([format!("{SERVER_MARKER}{text}")]);
    format!("console.{level}.apply(console, {args});")
}

/// Encode a full replay, envelope included. No messages means no replay.
pub fn encode_replay(messages: &[DiagnosticMessage]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let body: Vec<String> = messages
        .iter()
        .map(|m| encode_statement(m.level, &m.text))
        .collect();
    format!("\n{REPLAY_OPEN}\n{}\n{REPLAY_CLOSE}\n", body.join("\n"))
}
