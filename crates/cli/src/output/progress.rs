//! Progress display for push and pull
//!
//! One tick per file, with the path of the last finished item as message.
//! Hidden in quiet and JSON modes, and when progress is turned off.

use gd_core::SyncObserver;
use gd_core::SyncReport;
use gd_core::sync::Outcome;
use indicatif::{ProgressBar, ProgressStyle};

use super::OutputConfig;

const TEMPLATE: &str = "{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}";

/// Progress bar counting transferred files
#[derive(Debug)]
pub struct TransferProgress {
    bar: Option<ProgressBar>,
}

impl TransferProgress {
    pub fn new(config: &OutputConfig, prefix: &str) -> Self {
        let bar = if config.quiet || config.json || !config.progress {
            None
        } else {
            let bar = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar.set_prefix(prefix.to_string());
            Some(bar)
        };

        Self { bar }
    }

    /// The underlying bar, for suspending it around prompts
    pub fn bar(&self) -> Option<&ProgressBar> {
        self.bar.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}

impl SyncObserver for TransferProgress {
    fn started(&self, total_files: usize) {
        if let Some(bar) = &self.bar {
            bar.set_length(total_files as u64);
        }
    }

    fn item_finished(&self, path: &str, outcome: &Outcome) {
        let Some(bar) = &self.bar else { return };
        if !matches!(outcome, Outcome::Folder) {
            bar.inc(1);
        }
        bar.set_message(path.to_string());
    }

    fn finished(&self, _report: &SyncReport) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
