//! Tree synchronization
//!
//! Uploads local trees to the drive and downloads remote trees to disk, with
//! a per-item conflict policy. Failures of single items are collected in a
//! [`SyncReport`] and never stop the batch.

mod engine;
mod naming;
mod policy;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

pub use engine::{SyncEngine, SyncState};
pub use naming::{copy_name, first_free_copy_name};
pub use policy::{
    Action, Conflict, ConflictResolver, Decision, Direction, FixedPolicy, TransferPolicy,
};

/// Cooperative cancellation shared between a batch and its caller
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the running batch to stop before its next item
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A single item that could not be transferred
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub path: String,
    pub reason: String,
}

/// Result of processing one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Content written, under the given title
    Transferred(String),
    /// Left untouched because the target existed
    Skipped,
    /// Folder created or already present
    Folder,
    Failed(String),
}

/// Summary of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Relative paths of transferred files
    pub transferred: Vec<String>,
    /// Relative paths of files left untouched
    pub skipped: Vec<String>,
    pub failed: Vec<FailedItem>,
    pub folders_created: usize,
    /// Number of files in the source tree
    pub total_files: usize,
    /// The batch stopped early on request
    pub interrupted: bool,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }

    fn record(&mut self, path: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Transferred(_) => self.transferred.push(path.to_string()),
            Outcome::Skipped => self.skipped.push(path.to_string()),
            Outcome::Folder => {}
            Outcome::Failed(reason) => self.failed.push(FailedItem {
                path: path.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Progress callbacks for a batch
pub trait SyncObserver: Send + Sync {
    fn started(&self, _total_files: usize) {}

    fn item_finished(&self, _path: &str, _outcome: &Outcome) {}

    fn finished(&self, _report: &SyncReport) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_report_records_outcomes() {
        let mut report = SyncReport::default();
        report.record("a.txt", &Outcome::Transferred("a.txt".into()));
        report.record("b.txt", &Outcome::Skipped);
        report.record("dir", &Outcome::Folder);
        report.record("c.txt", &Outcome::Failed("boom".into()));
        assert_eq!(report.transferred, vec!["a.txt"]);
        assert_eq!(report.skipped, vec!["b.txt"]);
        assert_eq!(report.failed[0].reason, "boom");
        assert!(!report.is_success());
    }
}
