//! mkdir command - Create folders
//!
//! Missing intermediate folders are created too; folders that already exist
//! are left alone.

use clap::Args;
use gd_core::{RemoteStore, Resolver, Result, make_dir};
use serde::Serialize;

use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create folders
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Folder path(s) to create
    #[arg(required = true)]
    pub paths: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FolderOutput {
    path: String,
    id: String,
}

/// Execute the mkdir command
pub async fn execute(
    args: MkdirArgs,
    parent: Option<&str>,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let session = match Session::open(parent) {
        Ok(s) => s,
        Err(e) => return fail(&formatter, &e),
    };

    match make_dirs(&session.resolver(), &args.paths).await {
        Ok(folders) => {
            if formatter.is_json() {
                formatter.json(&folders);
            } else {
                for folder in &folders {
                    formatter.success(&format!("{}  {}", display_path(&folder.path), folder.id));
                }
            }
            ExitCode::Success
        }
        Err(e) => fail(&formatter, &e),
    }
}

/// Create every path in order, stopping at the first failure
pub(crate) async fn make_dirs<S: RemoteStore + ?Sized>(
    resolver: &Resolver<'_, S>,
    paths: &[String],
) -> Result<Vec<FolderOutput>> {
    let mut folders = Vec::with_capacity(paths.len());
    for path in paths {
        let id = make_dir(resolver, path).await?;
        let rendered = resolver.path_of(&id).await?;
        folders.push(FolderOutput {
            path: rendered.path,
            id,
        });
    }
    Ok(folders)
}

/// `~` based display form of a path relative to home
pub(crate) fn display_path(path: &str) -> String {
    if path.is_empty() {
        "~".to_string()
    } else {
        format!("~/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gd_core::memory::{MemoryStore, ROOT_ID};
    use gd_core::{Error, Parent};

    use crate::commands::resolver_for;

    #[tokio::test]
    async fn test_mkdir_creates_nested_folders_once() {
        let store = MemoryStore::new();
        let parent = Parent::new("origin", ROOT_ID, "My Drive");
        let resolver = resolver_for(&store, &parent);

        let first = make_dirs(&resolver, &["a/b/c".to_string(), "a/d".to_string()])
            .await
            .unwrap();
        let paths: Vec<_> = first.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a/b/c", "a/d"]);
        assert_eq!(store.folders_created(), 4);

        let again = make_dirs(&resolver, &["a/b/c".to_string()]).await.unwrap();
        assert_eq!(again[0].id, first[0].id);
        assert_eq!(store.folders_created(), 4);
    }

    #[tokio::test]
    async fn test_mkdir_below_duplicate_folders_fails() {
        let store = MemoryStore::new();
        store.add_folder(ROOT_ID, "a");
        store.add_folder(ROOT_ID, "a");
        let parent = Parent::new("origin", ROOT_ID, "My Drive");

        let err = make_dirs(&resolver_for(&store, &parent), &["a/b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousName { .. }));
        assert_eq!(store.folders_created(), 0);
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path(""), "~");
        assert_eq!(display_path("a/b"), "~/a/b");
    }
}
