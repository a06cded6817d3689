//! cd command - Change the working directory
//!
//! The new folder is resolved against the current working directory and
//! stored in the parent record, so later commands start from it.

use clap::Args;
use gd_core::{ParentManager, RemoteStore, Resolver, Result, WorkingDir, change_dir};

use super::mkdir::display_path;
use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Change the working directory
#[derive(Args, Debug)]
pub struct CdArgs {
    /// Folder to change to (defaults to home)
    #[arg(default_value = "~")]
    pub path: String,
}

/// Execute the cd command
pub async fn execute(args: CdArgs, parent: Option<&str>, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let session = match Session::open(parent) {
        Ok(s) => s,
        Err(e) => return fail(&formatter, &e),
    };

    let resolver = session.resolver();
    match change_working_dir(&resolver, &session.manager, &session.parent.name, &args.path).await {
        Ok(dir) => {
            formatter.emit(&dir, || display_path(&dir.path));
            ExitCode::Success
        }
        Err(e) => fail(&formatter, &e),
    }
}

/// Resolve `path` and record it as the working directory of `parent_name`
pub(crate) async fn change_working_dir<S: RemoteStore + ?Sized>(
    resolver: &Resolver<'_, S>,
    manager: &ParentManager,
    parent_name: &str,
    path: &str,
) -> Result<WorkingDir> {
    let dir = change_dir(resolver, path).await?;
    manager.set_cwd(parent_name, &dir.path, &dir.id)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gd_core::memory::{MemoryStore, ROOT_ID};
    use gd_core::{ConfigManager, Error, Parent};
    use tempfile::TempDir;

    use crate::commands::resolver_for;

    fn manager_with_origin() -> (ParentManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let manager = ParentManager::with_config_manager(ConfigManager::with_path(
            temp_dir.path().join("config.toml"),
        ));
        manager.set(Parent::new("origin", ROOT_ID, "My Drive")).unwrap();
        (manager, temp_dir)
    }

    #[tokio::test]
    async fn test_cd_persists_and_chains() {
        let store = MemoryStore::new();
        let docs = store.add_folder(ROOT_ID, "docs");
        let work = store.add_folder(docs.as_str(), "work");
        let (manager, _temp_dir) = manager_with_origin();

        let parent = manager.get("origin").unwrap();
        let dir = change_working_dir(&resolver_for(&store, &parent), &manager, "origin", "docs")
            .await
            .unwrap();
        assert_eq!(dir.id, docs);

        let parent = manager.get("origin").unwrap();
        assert_eq!(parent.display_cwd(), "~/docs");
        change_working_dir(&resolver_for(&store, &parent), &manager, "origin", "work")
            .await
            .unwrap();

        let parent = manager.get("origin").unwrap();
        assert_eq!(parent.cwd_id, work);
        assert_eq!(parent.display_cwd(), "~/docs/work");

        change_working_dir(&resolver_for(&store, &parent), &manager, "origin", "../..")
            .await
            .unwrap();
        let parent = manager.get("origin").unwrap();
        assert_eq!(parent.display_cwd(), "~");
        assert_eq!(parent.working_id(), ROOT_ID);
    }

    #[tokio::test]
    async fn test_cd_into_file_fails_and_keeps_cwd() {
        let store = MemoryStore::new();
        store.add_file(ROOT_ID, "notes.txt", b"n");
        let (manager, _temp_dir) = manager_with_origin();
        let parent = manager.get("origin").unwrap();

        let err = change_working_dir(&resolver_for(&store, &parent), &manager, "origin", "notes.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
        assert_eq!(manager.get("origin").unwrap().display_cwd(), "~");
    }
}
