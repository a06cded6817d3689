//! Formatter shared by every command
//!
//! JSON documents go to stdout untouched by `--quiet`; status lines are
//! decorated with a colored mark unless coloring is off.

use console::{Color, style};
use gd_core::config::ColorMode;
use serde::Serialize;

use super::OutputConfig;

#[derive(Debug, Clone, Copy)]
enum Mark {
    Done,
    Failed,
    Warning,
}

impl Mark {
    fn glyph(self) -> &'static str {
        match self {
            Mark::Done => "✓",
            Mark::Failed => "✗",
            Mark::Warning => "⚠",
        }
    }

    fn color(self) -> Color {
        match self {
            Mark::Done => Color::Green,
            Mark::Failed => Color::Red,
            Mark::Warning => Color::Yellow,
        }
    }
}

/// Prints command results in the configured format
#[derive(Debug, Clone)]
pub struct Formatter {
    json: bool,
    quiet: bool,
    color: ColorMode,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            json: config.json,
            quiet: config.quiet,
            color: config.color,
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print `value` as JSON, or the text built by `human` otherwise
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) {
        if self.json {
            self.json(value);
        } else {
            self.println(&human());
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet && !self.json {
            println!("{}", self.marked(Mark::Done, message, console::colors_enabled()));
        }
    }

    /// Errors are printed in every mode, as a JSON object in JSON mode
    pub fn error(&self, message: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": message }));
        } else {
            eprintln!("{}", self.marked(Mark::Failed, message, console::colors_enabled_stderr()));
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet && !self.json {
            eprintln!("{}", self.marked(Mark::Warning, message, console::colors_enabled_stderr()));
        }
    }

    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => self.error(&format!("Could not serialize output: {e}")),
        }
    }

    pub fn println(&self, message: &str) {
        if !self.quiet && !message.is_empty() {
            println!("{message}");
        }
    }

    fn use_color(&self, terminal_supports: bool) -> bool {
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => terminal_supports && !self.json,
        }
    }

    fn marked(&self, mark: Mark, message: &str, terminal_supports: bool) -> String {
        let glyph = style(mark.glyph())
            .fg(mark.color())
            .force_styling(self.use_color(terminal_supports));
        format!("{glyph} {message}")
    }
}
