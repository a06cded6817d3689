//! Terminal output
//!
//! Commands print through a [`Formatter`]; push and pull additionally drive a
//! [`TransferProgress`] bar.

mod formatter;
mod progress;

use gd_core::config::{ColorMode, Defaults, OutputFormat};

pub use formatter::Formatter;
pub use progress::TransferProgress;

/// How output should look, after combining flags with configured defaults
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub json: bool,
    pub color: ColorMode,
    pub progress: bool,
    /// Only errors and JSON documents are printed
    pub quiet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: false,
            color: ColorMode::Auto,
            progress: true,
            quiet: false,
        }
    }
}

impl OutputConfig {
    /// Flags only ever tighten what the configuration asks for
    pub fn from_flags(json: bool, no_color: bool, no_progress: bool, quiet: bool, defaults: &Defaults) -> Self {
        Self {
            json: json || defaults.output == OutputFormat::Json,
            color: if no_color { ColorMode::Never } else { defaults.color },
            progress: defaults.progress && !no_progress,
            quiet,
        }
    }
}
