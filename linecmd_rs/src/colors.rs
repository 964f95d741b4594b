//! Terminal colors for the interactive loop.
//!
//! Results are written uncolored; only the prompt, error messages and the
//! help listing are painted.

use std::io::IsTerminal;

use serde::Deserialize;

// ============================================================================
// ANSI Color Codes
// ============================================================================

pub const RED: &str = "\x1b[31m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RESET: &str = "\x1b[0m";

// ============================================================================
// Color State
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Whether to paint, given the mode and whether stderr is a terminal.
pub fn is_enabled(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stderr().is_terminal(),
    }
}

/// Colorizer handed to the loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            enabled: is_enabled(mode),
        }
    }

    /// A painter that never emits escape codes.
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Failed commands - RED
    pub fn error(&self, s: &str) -> String {
        self.wrap(s, RED)
    }

    /// Unknown commands, hints - YELLOW
    pub fn warn(&self, s: &str) -> String {
        self.wrap(s, YELLOW)
    }

    pub fn prompt(&self, s: &str) -> String {
        self.wrap_both(s, BOLD, CYAN)
    }

    pub fn header(&self, s: &str) -> String {
        self.wrap(s, BOLD)
    }

    /// Usage lines - DIM
    pub fn dim(&self, s: &str) -> String {
        self.wrap(s, DIM)
    }

    pub fn wrap(&self, s: &str, code: &str) -> String {
        if self.enabled {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    pub fn wrap_both(&self, s: &str, code1: &str, code2: &str) -> String {
        if self.enabled {
            format!("{code1}{code2}{s}{RESET}")
        } else {
            s.to_string()
        }
    }
}
