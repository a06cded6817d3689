//! push and pull commands - Upload and download trees
//!
//! Both run the sync engine with the batch conflict policy from
//! `--conflict`, falling back to `defaults.conflict` in the config. With the
//! `ask` policy each conflict is put to the terminal. Ctrl+C stops the batch
//! before its next item.

use std::path::{Path, PathBuf};

use clap::Args;
use gd_core::{
    CancelFlag, ConflictResolver, RemoteStore, Resolver, Result, SyncEngine, SyncObserver,
    SyncReport, TransferPolicy,
};
use tracing::debug;

use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, TransferProgress};
use crate::prompt::TerminalPrompt;

/// Upload a local file or folder
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Local file or folder to upload
    pub local: PathBuf,

    /// Drive folder to upload into (defaults to the working directory)
    pub remote: Option<String>,

    /// What to do with existing files: ask, skip, overwrite or copy
    #[arg(short, long)]
    pub conflict: Option<TransferPolicy>,
}

/// Download a drive file or folder
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Drive file or folder to download
    pub remote: String,

    /// Local folder to download into (defaults to the current directory)
    #[arg(default_value = ".")]
    pub local: PathBuf,

    /// What to do with existing files: ask, skip, overwrite or copy
    #[arg(short, long)]
    pub conflict: Option<TransferPolicy>,
}

/// Execute the push command
pub async fn execute_push(
    args: PushArgs,
    parent: Option<&str>,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());
    let session = match Session::open(parent) {
        Ok(s) => s,
        Err(e) => return fail(&formatter, &e),
    };

    let policy = args.conflict.unwrap_or(session.defaults.conflict);
    let remote = args.remote.unwrap_or_default();
    let progress = TransferProgress::new(&output_config, "push");
    let cancel = cancel_on_ctrl_c();
    let prompt = TerminalPrompt::new(cancel.clone()).with_progress(progress.bar());

    let result = push(
        &session.resolver(),
        &prompt,
        policy,
        &progress,
        cancel,
        &args.local,
        &remote,
    )
    .await;
    finish(&formatter, result, "Uploaded")
}

/// Execute the pull command
pub async fn execute_pull(
    args: PullArgs,
    parent: Option<&str>,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());
    let session = match Session::open(parent) {
        Ok(s) => s,
        Err(e) => return fail(&formatter, &e),
    };

    let policy = args.conflict.unwrap_or(session.defaults.conflict);
    let progress = TransferProgress::new(&output_config, "pull");
    let cancel = cancel_on_ctrl_c();
    let prompt = TerminalPrompt::new(cancel.clone()).with_progress(progress.bar());

    let result = pull(
        &session.resolver(),
        &prompt,
        policy,
        &progress,
        cancel,
        &args.remote,
        &args.local,
    )
    .await;
    finish(&formatter, result, "Downloaded")
}

pub(crate) async fn push<S: RemoteStore + ?Sized>(
    resolver: &Resolver<'_, S>,
    conflicts: &dyn ConflictResolver,
    policy: TransferPolicy,
    observer: &dyn SyncObserver,
    cancel: CancelFlag,
    local: &Path,
    remote: &str,
) -> Result<SyncReport> {
    SyncEngine::new(resolver, conflicts)
        .with_policy(policy)
        .with_observer(observer)
        .with_cancel(cancel)
        .upload(local, remote)
        .await
}

pub(crate) async fn pull<S: RemoteStore + ?Sized>(
    resolver: &Resolver<'_, S>,
    conflicts: &dyn ConflictResolver,
    policy: TransferPolicy,
    observer: &dyn SyncObserver,
    cancel: CancelFlag,
    remote: &str,
    local: &Path,
) -> Result<SyncReport> {
    SyncEngine::new(resolver, conflicts)
        .with_policy(policy)
        .with_observer(observer)
        .with_cancel(cancel)
        .download(remote, local)
        .await
}

/// A flag raised by the first Ctrl+C
fn cancel_on_ctrl_c() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ctrl+C received");
            flag.cancel();
        }
    });
    cancel
}

fn finish(formatter: &Formatter, result: Result<SyncReport>, verb: &str) -> ExitCode {
    match result {
        Ok(report) => {
            formatter.emit(&report, || render_report(&report, verb));
            if report.interrupted {
                ExitCode::Interrupted
            } else if !report.failed.is_empty() {
                ExitCode::GeneralError
            } else {
                ExitCode::Success
            }
        }
        Err(e) => fail(formatter, &e),
    }
}

/// Summary of a finished batch, one fact per line
pub(crate) fn render_report(report: &SyncReport, verb: &str) -> String {
    let mut lines = vec![format!(
        "{verb} {} of {} file(s)",
        report.transferred.len(),
        report.total_files
    )];
    if report.folders_created > 0 {
        lines.push(format!("Created {} folder(s)", report.folders_created));
    }
    for path in &report.skipped {
        lines.push(format!("Skipped {path}"));
    }
    for failure in &report.failed {
        lines.push(format!("Failed {}: {}", failure.path, failure.reason));
    }
    if report.interrupted {
        lines.push("Interrupted before all items were processed".to_string());
    }
    lines.join("\n")
}
