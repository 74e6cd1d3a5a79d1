/*!
format.rs

Styling for human-facing diagnostics (typo notices, ambiguity reports,
`Error:` prefixes).

  - Color is used only when the destination stream is a terminal.
  - NO_COLOR disables color everywhere.
  - Captured child output is never restyled; only our own messages are.

Public API:
  - StyleOptions::detect(stream) / StyleOptions::plain()
  - color(role, text, &StyleOptions) -> String
*/

use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleOptions {
    pub use_color: bool,
}

impl StyleOptions {
    /// Style for `stream`: colored when it is a terminal and NO_COLOR is unset.
    pub fn detect(stream: &impl IsTerminal) -> Self {
        if std::env::var_os("NO_COLOR").is_some() || !stream.is_terminal() {
            return Self::plain();
        }
        StyleOptions { use_color: true }
    }

    pub fn plain() -> Self {
        StyleOptions { use_color: false }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Warning,
    Error,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Warning => "38;5;214", // orange
        Role::Error => "38;5;196",   // red
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}
