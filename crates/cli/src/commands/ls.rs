//! ls command - List the contents of a folder
//!
//! Lists the working directory, or the given path, through the tree
//! enumerator. Folders are marked `D`, everything else `F`.

use clap::Args;
use gd_core::{Depth, RemoteStore, Resolver, Result, TreeListing, enumerate_remote};

use super::{Session, fail, parse_depth};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List folder contents
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Path to list (defaults to the working directory)
    pub path: Option<String>,

    /// Show object ids next to paths
    #[arg(short = 'a', long = "ids")]
    pub ids: bool,

    /// How deep to list: current, all, or a number of levels
    #[arg(short, long, default_value = "current", value_parser = parse_depth)]
    pub depth: Depth,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, parent: Option<&str>, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let session = match Session::open(parent) {
        Ok(s) => s,
        Err(e) => return fail(&formatter, &e),
    };

    match list(&session.resolver(), args.path.as_deref(), args.depth).await {
        Ok(listing) => {
            formatter.emit(&listing, || render_listing(&listing, args.ids));
            ExitCode::Success
        }
        Err(e) => fail(&formatter, &e),
    }
}

/// Enumerate `path`, or the working directory when no path is given
pub(crate) async fn list<S: RemoteStore + ?Sized>(
    resolver: &Resolver<'_, S>,
    path: Option<&str>,
    depth: Depth,
) -> Result<TreeListing> {
    match path {
        Some(path) => enumerate_remote(resolver, path, None, depth).await,
        None => enumerate_remote(resolver, "", Some(resolver.working_id()), depth).await,
    }
}

/// One line per entry: kind marker, path, and optionally the id
pub(crate) fn render_listing(listing: &TreeListing, show_ids: bool) -> String {
    let lines: Vec<String> = listing
        .entries
        .iter()
        .filter(|entry| !entry.path.is_empty())
        .map(|entry| {
            let marker = entry.kind.marker();
            if show_ids {
                format!("{marker}  {}  {}", entry.path, entry.id)
            } else {
                format!("{marker}  {}", entry.path)
            }
        })
        .collect();

    if lines.is_empty() {
        "(empty)".to_string()
    } else {
        lines.join("\n")
    }
}
