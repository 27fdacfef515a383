//! Console protocol: the polyfill injected into the script context, the
//! replay encoding it feeds, and the decoder that recovers diagnostics.
//!
//! # Modules
//!
//! - [`polyfill`] — JS `console` that records calls with the `[SERVER] ` marker
//! - [`protocol`] — levels, `DiagnosticMessage`, replay statement encoder
//! - [`decode`]   — `ReplayFraming`, `decode_replay()`, `extract_error_messages()`

pub mod decode;
pub mod polyfill;
pub mod protocol;

pub use decode::{decode_replay, extract_error_messages, parse_statement, ReplayFraming};
pub use polyfill::{console_polyfill, context_source};
pub use protocol::{
    encode_replay, encode_statement, ConsoleLevel, DiagnosticMessage, REPLAY_CLOSE, REPLAY_OPEN,
    SERVER_MARKER,
};
