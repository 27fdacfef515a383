//! Log output for the `ssr-bridge` binary and embedding hosts.
//!
//! Everything is written to stderr. The CLI prints rendered markup and
//! generated scripts on stdout, and that output must stay pipeable into a
//! file or another tool without log lines mixed in.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber: JSON lines when `json` is set (for log
/// shippers), human-readable lines otherwise. `RUST_LOG` overrides `level`.
///
/// A host that already installed a subscriber keeps it; the call is then a
/// no-op.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let json_layer = json.then(|| fmt::layer().with_writer(std::io::stderr).json());
    let text_layer = (!json).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .ok();
}
