//! Tree enumeration
//!
//! Flattens a remote or local tree into a listing of relative paths. Both
//! backends produce the same shape: `/` separated paths relative to the root,
//! folders listed before their contents.

use std::io;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::path;
use crate::resolver::Resolver;
use crate::traits::{ObjectKind, RemoteObject, RemoteStore};

/// How deep to enumerate below the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    /// Every entry at every level
    #[default]
    All,
    /// Immediate children only
    Current,
    /// Entries at most this many levels below the root
    Levels(u32),
}

impl Depth {
    fn limit(self) -> Option<u32> {
        match self {
            Depth::All => None,
            Depth::Current => Some(1),
            Depth::Levels(n) => Some(n),
        }
    }
}

/// One entry of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Path relative to the enumeration root
    pub path: String,
    /// Remote id, or the absolute local path (for display) in local listings
    pub id: String,
    pub kind: ObjectKind,
    /// Exact location on disk for local listings; `path` and `id` may be
    /// lossy for names that are not UTF-8
    #[serde(skip)]
    pub local_path: Option<PathBuf>,
}

impl Entry {
    pub fn remote(path: String, id: String, kind: ObjectKind) -> Self {
        Self {
            path,
            id,
            kind,
            local_path: None,
        }
    }

    pub fn local(path: String, location: PathBuf, kind: ObjectKind) -> Self {
        Self {
            path,
            id: location.display().to_string(),
            kind,
            local_path: Some(location),
        }
    }
}

/// Flat listing of a tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeListing {
    pub entries: Vec<Entry>,
    /// Number of non-folder entries listed
    pub non_folder_count: usize,
}

impl TreeListing {
    fn single(entry: Entry) -> Self {
        Self {
            non_folder_count: usize::from(!entry.kind.is_folder()),
            entries: vec![entry],
        }
    }

    fn push(&mut self, entry: Entry) {
        if !entry.kind.is_folder() {
            self.non_folder_count += 1;
        }
        self.entries.push(entry);
    }

    fn append(&mut self, other: TreeListing) {
        self.non_folder_count += other.non_folder_count;
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn kinds(&self) -> Vec<ObjectKind> {
        self.entries.iter().map(|e| e.kind).collect()
    }

    /// Keep only entries at `indices`, in that order
    pub(crate) fn select(&self, indices: &[usize]) -> TreeListing {
        let mut listing = TreeListing::default();
        for &i in indices {
            listing.push(self.entries[i].clone());
        }
        listing
    }
}

/// Enumerate a remote tree
///
/// The root is `root_id` when known, otherwise `root_path` resolved as an
/// existing folder or file.
pub async fn enumerate_remote<S: RemoteStore + ?Sized>(
    resolver: &Resolver<'_, S>,
    root_path: &str,
    root_id: Option<&str>,
    depth: Depth,
) -> Result<TreeListing> {
    let store = resolver.store();
    let root_id = match root_id {
        Some(id) => id.to_string(),
        None => {
            let chain = resolver.resolve_existing(root_path).await?;
            chain
                .id()
                .map(str::to_string)
                .ok_or_else(|| Error::NotFound(root_path.to_string()))?
        }
    };
    let root = store.get_metadata(&root_id).await?;
    debug!(root = %root.id, ?depth, "Enumerating remote tree");

    if !root.is_folder() {
        return Ok(TreeListing::single(Entry::remote(root.title, root.id, root.kind)));
    }

    let limit = depth.limit();
    if limit == Some(0) {
        return Ok(TreeListing::default());
    }

    let listing = walk_remote(store, root.id.clone(), String::new(), 1, limit).await?;
    if listing.is_empty() {
        return Ok(TreeListing::single(Entry::remote(
            String::new(),
            root.id,
            ObjectKind::Folder,
        )));
    }
    Ok(listing)
}

fn walk_remote<'a, S: RemoteStore + ?Sized>(
    store: &'a S,
    folder_id: String,
    prefix: String,
    level: u32,
    limit: Option<u32>,
) -> BoxFuture<'a, Result<TreeListing>> {
    Box::pin(async move {
        let mut children: Vec<RemoteObject> = store.list_children(&folder_id).await?;
        children.sort_by(|a, b| a.title.cmp(&b.title));

        let mut listing = TreeListing::default();
        for child in children {
            let child_path = path::join(&prefix, &child.title);
            let descend = child.is_folder() && limit.is_none_or(|max| level < max);
            listing.push(Entry::remote(child_path.clone(), child.id.clone(), child.kind));
            if descend {
                let subtree = walk_remote(store, child.id, child_path, level + 1, limit).await?;
                listing.append(subtree);
            }
        }
        Ok(listing)
    })
}

/// Enumerate a local tree
///
/// Only [`Depth::All`] and [`Depth::Current`] are supported.
pub fn enumerate_local(root: &Path, depth: Depth) -> Result<TreeListing> {
    let max_depth = match depth {
        Depth::All => usize::MAX,
        Depth::Current => 1,
        Depth::Levels(_) => {
            return Err(Error::UnsupportedFeature(
                "Depth levels are only supported for remote trees".into(),
            ));
        }
    };

    let metadata = match std::fs::metadata(root) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotFound(root.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let absolute = std::path::absolute(root)?;
    debug!(root = %absolute.display(), ?depth, "Enumerating local tree");

    if !metadata.is_dir() {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(TreeListing::single(Entry::local(name, absolute, ObjectKind::File)));
    }

    let mut listing = TreeListing::default();
    for entry in WalkDir::new(&absolute)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(&absolute)
            .map_err(|e| Error::General(e.to_string()))?;
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let kind = if entry.file_type().is_dir() {
            ObjectKind::Folder
        } else {
            ObjectKind::File
        };
        listing.push(Entry::local(path, entry.into_path(), kind));
    }

    if listing.is_empty() {
        return Ok(TreeListing::single(Entry::local(
            String::new(),
            absolute,
            ObjectKind::Folder,
        )));
    }
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::memory::{MemoryStore, ROOT_ID};

    /// docs/{a.txt, b.jpg, sub/{c.jpg}}, plus top.jpg
    fn sample_store() -> (MemoryStore, String) {
        let store = MemoryStore::new();
        let docs = store.add_folder(ROOT_ID, "docs");
        store.add_file(&docs, "a.txt", b"a");
        store.add_file(&docs, "b.jpg", b"b");
        let sub = store.add_folder(&docs, "sub");
        store.add_file(&sub, "c.jpg", b"c");
        store.add_file(ROOT_ID, "top.jpg", b"t");
        (store, docs)
    }

    #[tokio::test]
    async fn test_remote_all_is_preorder() {
        let (store, _) = sample_store();
        let resolver = Resolver::new(&store, ROOT_ID);
        let listing = enumerate_remote(&resolver, "", None, Depth::All)
            .await
            .unwrap();
        assert_eq!(
            listing.paths(),
            vec![
                "docs",
                "docs/a.txt",
                "docs/b.jpg",
                "docs/sub",
                "docs/sub/c.jpg",
                "top.jpg"
            ]
        );
        assert_eq!(listing.non_folder_count, 4);
    }

    #[tokio::test]
    async fn test_remote_current_and_levels() {
        let (store, _) = sample_store();
        let resolver = Resolver::new(&store, ROOT_ID);

        let current = enumerate_remote(&resolver, "", None, Depth::Current)
            .await
            .unwrap();
        assert_eq!(current.paths(), vec!["docs", "top.jpg"]);
        assert_eq!(current.non_folder_count, 1);

        let one = enumerate_remote(&resolver, "", None, Depth::Levels(1))
            .await
            .unwrap();
        assert_eq!(one, current);

        let two = enumerate_remote(&resolver, "", None, Depth::Levels(2))
            .await
            .unwrap();
        assert_eq!(
            two.paths(),
            vec!["docs", "docs/a.txt", "docs/b.jpg", "docs/sub", "top.jpg"]
        );

        let none = enumerate_remote(&resolver, "", None, Depth::Levels(0))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_all_matches_recursive_current() {
        let (store, _) = sample_store();
        let resolver = Resolver::new(&store, ROOT_ID);
        let all = enumerate_remote(&resolver, "", None, Depth::All)
            .await
            .unwrap();

        let mut expected = Vec::new();
        let mut pending = vec![(String::new(), ROOT_ID.to_string())];
        while let Some((prefix, id)) = pending.pop() {
            let level = enumerate_remote(&resolver, "", Some(id.as_str()), Depth::Current)
                .await
                .unwrap();
            for entry in level.entries {
                if entry.path.is_empty() {
                    continue;
                }
                let full = path::join(&prefix, &entry.path);
                if entry.kind.is_folder() {
                    pending.push((full.clone(), entry.id.clone()));
                }
                expected.push(full);
            }
        }

        let mut actual: Vec<String> = all.paths().into_iter().map(String::from).collect();
        actual.sort();
        expected.sort();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_remote_file_root() {
        let (store, _) = sample_store();
        let resolver = Resolver::new(&store, ROOT_ID);
        let listing = enumerate_remote(&resolver, "docs/sub/c.jpg", None, Depth::All)
            .await
            .unwrap();
        assert_eq!(listing.paths(), vec!["c.jpg"]);
        assert_eq!(listing.non_folder_count, 1);
    }

    #[tokio::test]
    async fn test_remote_empty_folder() {
        let store = MemoryStore::new();
        let empty = store.add_folder(ROOT_ID, "empty");
        let resolver = Resolver::new(&store, ROOT_ID);
        for depth in [Depth::All, Depth::Current, Depth::Levels(3)] {
            let listing = enumerate_remote(&resolver, "empty", None, depth)
                .await
                .unwrap();
            assert_eq!(listing.paths(), vec![""]);
            assert_eq!(listing.ids(), vec![empty.as_str()]);
            assert_eq!(listing.kinds(), vec![ObjectKind::Folder]);
            assert_eq!(listing.non_folder_count, 0);
        }
    }

    #[tokio::test]
    async fn test_remote_missing_root() {
        let (store, _) = sample_store();
        let resolver = Resolver::new(&store, ROOT_ID);
        let err = enumerate_remote(&resolver, "nothing/here", None, Depth::All)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }

    #[test]
    fn test_local_all_and_current() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("photos");
        fs::create_dir_all(root.join("2024/summer")).unwrap();
        fs::write(root.join("cover.jpg"), b"x").unwrap();
        fs::write(root.join("2024/summer/beach.jpg"), b"x").unwrap();

        let all = enumerate_local(&root, Depth::All).unwrap();
        assert_eq!(
            all.paths(),
            vec!["2024", "2024/summer", "2024/summer/beach.jpg", "cover.jpg"]
        );
        assert_eq!(all.non_folder_count, 2);
        assert!(Path::new(all.ids()[3]).is_absolute());
        let cover = all.entries[3].local_path.as_deref().unwrap();
        assert!(cover.is_absolute());
        assert!(cover.ends_with("photos/cover.jpg"));

        let current = enumerate_local(&root, Depth::Current).unwrap();
        assert_eq!(current.paths(), vec!["2024", "cover.jpg"]);
    }

    #[test]
    fn test_local_file_root_and_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.md");
        fs::write(&file, b"x").unwrap();
        let listing = enumerate_local(&file, Depth::All).unwrap();
        assert_eq!(listing.paths(), vec!["notes.md"]);
        assert_eq!(listing.non_folder_count, 1);
        assert!(listing.entries[0].local_path.as_deref().unwrap().ends_with("notes.md"));

        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();
        let listing = enumerate_local(&empty, Depth::All).unwrap();
        assert_eq!(listing.paths(), vec![""]);
        assert_eq!(listing.non_folder_count, 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_local_keeps_exact_location_of_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let name = OsStr::from_bytes(b"caf\xe9.txt");
        fs::write(dir.path().join(name), b"x").unwrap();

        let listing = enumerate_local(dir.path(), Depth::All).unwrap();
        let location = listing.entries[0].local_path.as_deref().unwrap();
        assert_eq!(location.file_name(), Some(name));
        assert!(location.exists());
    }

    #[test]
    fn test_local_rejects_levels_and_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            enumerate_local(dir.path(), Depth::Levels(2)),
            Err(Error::UnsupportedFeature(_))
        ));
        assert!(matches!(
            enumerate_local(&dir.path().join("missing"), Depth::All),
            Err(Error::NotFound(_))
        ));
    }
}
