//! The `console` object injected ahead of the bundle.

use super::protocol::{ConsoleLevel, SERVER_MARKER};

/// JavaScript source defining a recording `console`.
///
/// Every call is pushed onto `console.history` as `{level, arguments}` with
/// the server marker prepended to the first argument. The bundle turns that
/// history into the replay text.
pub fn console_polyfill() -> String {
    let levels: Vec<String> = ConsoleLevel::ALL
        .iter()
        .map(|l| format!("'{}'", l.as_str()))
        .collect();
    format!(
        r#"var console = {{ history: [] }};
[{levels}].forEach(function (level) {{
  console[level] = function () {{
    var argArray = Array.prototype.slice.call(arguments);
    if (argArray.length > 0) {{
      argArray[0] = '{marker}' + argArray[0];
    }}
    console.history.push({{ level: level, arguments: argArray }});
  }};
}});
"#,
        levels = levels.join(", "),
        marker = SERVER_MARKER,
    )
}

/// Polyfill followed by the bundle: the source a fresh context is seeded with.
pub fn context_source(bundle: &str) -> String {
    format!("{}\n{}", console_polyfill(), bundle)
}
