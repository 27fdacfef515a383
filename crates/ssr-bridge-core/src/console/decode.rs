//! Decoding a console replay back into structured diagnostics.
//!
//! The decoder only understands the statement shape produced by
//! [`super::protocol::encode_statement`]. Any line that does not match is
//! treated as incidental output and skipped, never as an error.

use serde::{Deserialize, Serialize};

use super::protocol::{ConsoleLevel, DiagnosticMessage, REPLAY_CLOSE, SERVER_MARKER};

/// How to locate the statement lines inside a replay envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayFraming {
    /// Skip a fixed number of leading and trailing lines unconditionally.
    Fixed { header: usize, footer: usize },
    /// Take the lines between a `<script ...>` line and a `</script>` line.
    ScriptTag,
}

impl Default for ReplayFraming {
    fn default() -> Self {
        Self::Fixed {
            header: 2,
            footer: 2,
        }
    }
}

impl ReplayFraming {
    /// Statement lines of `replay`, envelope removed.
    pub fn body<'a>(&self, replay: &'a str) -> Vec<&'a str> {
        let lines: Vec<&str> = replay.split('\n').collect();
        match *self {
            Self::Fixed { header, footer } => {
                if lines.len() <= header + footer {
                    return Vec::new();
                }
                lines[header..lines.len() - footer].to_vec()
            }
            Self::ScriptTag => {
                let mut body = Vec::new();
                let mut inside = false;
                for line in lines {
                    let trimmed = line.trim();
                    if inside {
                        if trimmed == REPLAY_CLOSE {
                            inside = false;
                        } else {
                            body.push(line);
                        }
                    } else if trimmed.starts_with("<script") {
                        inside = true;
                    }
                }
                body
            }
        }
    }
}

/// Parse one replay statement.
///
/// Accepts `console.<level>.apply(console, ["[SERVER] <text>", ...]);` where
/// the argument list is a JSON array whose first element is a string carrying
/// the marker. Further arguments are folded into the text the way a console
/// formats them: `%s`-style specifiers in the first string consume arguments
/// in order, and whatever is left is appended separated by spaces.
pub fn parse_statement(line: &str) -> Option<DiagnosticMessage> {
    let rest = line.trim().strip_prefix("console.")?;
    let (level, rest) = rest.split_once('.')?;
    let level: ConsoleLevel = level.parse().ok()?;

    let rest = rest.strip_prefix("apply(")?.trim_start();
    let rest = rest.strip_prefix("console")?.trim_start();
    let rest = rest.strip_prefix(',')?.trim_start();
    let args = rest.strip_suffix(");")?.trim_end();

    let args: Vec<serde_json::Value> = serde_json::from_str(args).ok()?;
    let (first, rest) = args.split_first()?;
    let text = first.as_str()?.strip_prefix(SERVER_MARKER)?;
    Some(DiagnosticMessage::new(level, format_arguments(text, rest)))
}

/// Render one console argument as text.
fn argument_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute format specifiers in `template` with `args`, then append the
/// unused arguments.
fn format_arguments(template: &str, args: &[serde_json::Value]) -> String {
    if args.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut remaining = args.iter();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(spec @ ('s' | 'd' | 'i' | 'f' | 'o' | 'O' | 'j' | 'c')) => match remaining.next() {
                Some(arg) => {
                    chars.next();
                    // %c carries CSS, which has no text form.
                    if spec != 'c' {
                        out.push_str(&argument_text(arg));
                    }
                }
                None => out.push('%'),
            },
            _ => out.push('%'),
        }
    }

    for arg in remaining {
        out.push(' ');
        out.push_str(&argument_text(arg));
    }
    out
}

/// Decode every server-tagged statement in `replay`, in call order.
pub fn decode_replay(replay: &str, framing: &ReplayFraming) -> Vec<DiagnosticMessage> {
    framing
        .body(replay)
        .into_iter()
        .filter_map(parse_statement)
        .collect()
}

/// Extract the text of every server-tagged `error` call in `replay`.
pub fn extract_error_messages(replay: &str, framing: &ReplayFraming) -> Vec<String> {
    decode_replay(replay, framing)
        .into_iter()
        .filter(DiagnosticMessage::is_error)
        .map(|m| m.text)
        .collect()
}
