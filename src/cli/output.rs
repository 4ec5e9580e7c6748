//! Shared output helpers for CLI commands.
//!
//! Global flags (`--json`, `--quiet`, `--verbose`, `--no-color`) are
//! propagated through `SURFACER_*` environment variables by `main` so
//! every command module can check them without threading state around.

use serde::Serialize;

/// True when `--json` was passed. Commands should emit a single JSON
/// object on stdout and keep human text off it.
pub fn is_json() -> bool {
    std::env::var("SURFACER_JSON").is_ok()
}

/// True when `--quiet` was passed. Suppresses non-essential output.
pub fn is_quiet() -> bool {
    std::env::var("SURFACER_QUIET").is_ok()
}

/// True when `--verbose` was passed.
pub fn is_verbose() -> bool {
    std::env::var("SURFACER_VERBOSE").is_ok()
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("  Error: failed to serialize output: {e}"),
    }
}

/// Terminal symbols with optional ANSI color.
///
/// Color is disabled by `--no-color`, the conventional `NO_COLOR`
/// variable, or JSON mode.
pub struct Styled {
    color: bool,
}

impl Styled {
    pub fn new() -> Self {
        let color = std::env::var("SURFACER_NO_COLOR").is_err()
            && std::env::var("NO_COLOR").is_err()
            && !is_json();
        Self { color }
    }

    /// Green check mark, or `[OK]` without color.
    pub fn ok_sym(&self) -> &'static str {
        if self.color {
            "\x1b[32m✓\x1b[0m"
        } else {
            "[OK]"
        }
    }

    /// Yellow exclamation, or `[!!]` without color.
    pub fn warn_sym(&self) -> &'static str {
        if self.color {
            "\x1b[33m!\x1b[0m"
        } else {
            "[!!]"
        }
    }

    /// Red cross, or `[XX]` without color.
    pub fn fail_sym(&self) -> &'static str {
        if self.color {
            "\x1b[31m✗\x1b[0m"
        } else {
            "[XX]"
        }
    }
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}
