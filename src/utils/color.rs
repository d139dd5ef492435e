//! ANSI colour helpers for terminal output.
//!
//! Pure string formatting; whether colour is applied at all is decided by
//! the caller, there is no process-wide switch.

use super::config::{ANSI_RESET, ANSI_YELLOW};

/// Wrap text in yellow ANSI codes
pub fn yellow(text: &str) -> String {
    format!("{}{}{}", ANSI_YELLOW, text, ANSI_RESET)
}

/// Apply `yellow` only when `enabled`
pub fn highlight(text: &str, enabled: bool) -> String {
    if enabled {
        yellow(text)
    } else {
        text.to_string()
    }
}
