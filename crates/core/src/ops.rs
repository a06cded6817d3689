//! Single-object remote operations
//!
//! Directory creation, removal and working-directory changes, all addressed
//! by path through a [`Resolver`].

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::resolver::Resolver;
use crate::traits::{ObjectKind, RemoteStore, TypeFilter};

/// A working directory: its path relative to home and its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkingDir {
    pub path: String,
    pub id: String,
}

/// What a removal affected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedObject {
    pub path: String,
    pub id: String,
    pub kind: ObjectKind,
    /// Deleted permanently instead of trashed
    pub permanent: bool,
}

/// Create the folder at `path` along with any missing parents
///
/// Returns the id of the (possibly pre-existing) folder.
pub async fn make_dir<S: RemoteStore + ?Sized>(
    resolver: &Resolver<'_, S>,
    path: &str,
) -> Result<String> {
    let chain = resolver.resolve(path, true, TypeFilter::Folder).await?;
    let id = chain
        .id()
        .ok_or_else(|| Error::NotFound(path.to_string()))?
        .to_string();
    if chain.created() > 0 {
        info!(path, id = %id, created = chain.created(), "Created folder");
    }
    Ok(id)
}

/// Remove the folder or file at `path`
///
/// Trashes by default, deletes permanently when `hard` is set. The home
/// folder itself is only removed with `allow_home`.
pub async fn remove<S: RemoteStore + ?Sized>(
    resolver: &Resolver<'_, S>,
    path: &str,
    hard: bool,
    allow_home: bool,
) -> Result<RemovedObject> {
    let chain = resolver.resolve_existing(path).await?;
    let id = chain
        .id()
        .ok_or_else(|| Error::NotFound(path.to_string()))?
        .to_string();
    if id == resolver.home_id() && !allow_home {
        return Err(Error::InvalidPath(format!(
            "Refusing to remove the drive root '{path}'"
        )));
    }

    let store = resolver.store();
    let object = store.get_metadata(&id).await?;
    let rendered = resolver.path_of(&id).await?;
    if hard {
        store.delete(&id).await?;
    } else {
        store.trash(&id).await?;
    }
    info!(path = %rendered.path, id = %id, permanent = hard, "Removed");

    Ok(RemovedObject {
        path: rendered.path,
        id,
        kind: object.kind,
        permanent: hard,
    })
}

/// Resolve the folder at `path` as a new working directory
pub async fn change_dir<S: RemoteStore + ?Sized>(
    resolver: &Resolver<'_, S>,
    path: &str,
) -> Result<WorkingDir> {
    let chain = resolver.resolve(path, false, TypeFilter::Folder).await?;
    let id = chain
        .id()
        .ok_or_else(|| Error::NotFound(path.to_string()))?
        .to_string();
    let rendered = resolver.path_of(&id).await?;
    Ok(WorkingDir {
        path: rendered.path,
        id,
    })
}
