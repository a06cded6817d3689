//! rm command - Trash or delete files and folders
//!
//! Moves each path to the trash. With `--force` objects are deleted
//! permanently, after a confirmation unless `--yes` is given.

use clap::Args;
use console::Term;
use gd_core::{RemoteStore, RemovedObject, Resolver, remove};
use serde::Serialize;

use super::mkdir::display_path;
use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove files or folders
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Path(s) to remove
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Delete permanently instead of moving to the trash
    #[arg(short, long)]
    pub force: bool,

    /// Do not ask before deleting permanently
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    removed: Vec<RemovedObject>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<FailedRemoval>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FailedRemoval {
    path: String,
    error: String,
    #[serde(skip)]
    exit_code: Option<ExitCode>,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, parent: Option<&str>, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    if args.force && !args.yes {
        match confirm_permanent(&args.paths, &formatter) {
            Ok(true) => {}
            Ok(false) => {
                formatter.warning("Nothing removed.");
                return ExitCode::Success;
            }
            Err(code) => return code,
        }
    }

    let session = match Session::open(parent) {
        Ok(s) => s,
        Err(e) => return fail(&formatter, &e),
    };

    let (removed, failed) = remove_paths(&session.resolver(), &args.paths, args.force).await;

    if formatter.is_json() {
        let output = RmOutput {
            status: if failed.is_empty() { "success" } else { "partial" },
            removed,
            failed,
        };
        formatter.json(&output);
        return ExitCode::Success;
    }

    for object in &removed {
        let verb = if object.permanent { "Deleted" } else { "Trashed" };
        formatter.success(&format!("{verb} {}", display_path(&object.path)));
    }
    for failure in &failed {
        formatter.error(&format!("{}: {}", failure.path, failure.error));
    }

    match failed.first() {
        None => ExitCode::Success,
        Some(_) if failed.len() > 1 || !removed.is_empty() => ExitCode::GeneralError,
        Some(only) => only.exit_code.unwrap_or(ExitCode::GeneralError),
    }
}

/// Remove every path, continuing past failures
pub(crate) async fn remove_paths<S: RemoteStore + ?Sized>(
    resolver: &Resolver<'_, S>,
    paths: &[String],
    hard: bool,
) -> (Vec<RemovedObject>, Vec<FailedRemoval>) {
    let mut removed = Vec::new();
    let mut failed = Vec::new();
    for path in paths {
        match remove(resolver, path, hard, false).await {
            Ok(object) => removed.push(object),
            Err(e) => failed.push(FailedRemoval {
                path: path.clone(),
                error: e.to_string(),
                exit_code: Some(ExitCode::from(&e)),
            }),
        }
    }
    (removed, failed)
}

/// Ask before deleting permanently; refuse without a terminal
fn confirm_permanent(paths: &[String], formatter: &Formatter) -> Result<bool, ExitCode> {
    let term = Term::stderr();
    if !term.is_term() || formatter.is_json() {
        formatter.error("Refusing to delete permanently without confirmation; pass --yes");
        return Err(ExitCode::UsageError);
    }

    let prompt = format!(
        "Permanently delete {}? [y/N] ",
        paths
            .iter()
            .map(|p| format!("'{p}'"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let answer = term
        .write_str(&prompt)
        .and_then(|_| term.read_line())
        .map_err(|_| ExitCode::Interrupted)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
