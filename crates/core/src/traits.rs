//! RemoteStore trait definition
//!
//! This trait defines the primitives the core needs from an ID-addressed
//! cloud drive. It allows the engine to be decoupled from the specific
//! HTTP API, and lets tests substitute an in-memory store.

use std::path::Path;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Whether a remote object is a folder or anything else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Folder,
    File,
}

impl ObjectKind {
    pub fn is_folder(self) -> bool {
        matches!(self, ObjectKind::Folder)
    }

    /// Single-letter marker used in listings
    pub fn marker(self) -> char {
        match self {
            ObjectKind::Folder => 'D',
            ObjectKind::File => 'F',
        }
    }
}

/// Kind restriction applied when looking objects up by title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    /// Only folders
    Folder,
    /// Anything except folders
    NotFolder,
    /// No restriction
    Any,
}

impl TypeFilter {
    /// Check whether an object of `kind` passes this filter
    pub fn accepts(self, kind: ObjectKind) -> bool {
        match self {
            TypeFilter::Folder => kind.is_folder(),
            TypeFilter::NotFolder => !kind.is_folder(),
            TypeFilter::Any => true,
        }
    }
}

/// Metadata for a file or folder in the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Opaque, globally unique id
    pub id: String,

    /// Title, unique only within a single parent
    pub title: String,

    /// Folder or file
    pub kind: ObjectKind,

    /// Parent folder ids, first one is the canonical parent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_ids: Vec<String>,

    /// Size in bytes (0 for folders)
    pub size_bytes: u64,

    /// Last modification time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<Timestamp>,
}

impl RemoteObject {
    /// Create metadata for a file
    pub fn file(
        id: impl Into<String>,
        title: impl Into<String>,
        parent_id: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ObjectKind::File,
            parent_ids: vec![parent_id.into()],
            size_bytes: size,
            modified: None,
        }
    }

    /// Create metadata for a folder
    pub fn folder(
        id: impl Into<String>,
        title: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ObjectKind::Folder,
            parent_ids: vec![parent_id.into()],
            size_bytes: 0,
            modified: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    /// The canonical parent id, if any
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_ids.first().map(String::as_str)
    }

    /// Human-readable size
    pub fn size_human(&self) -> String {
        humansize::format_size(self.size_bytes, humansize::BINARY)
    }
}

/// Where uploaded content should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    /// Create a new object under `parent_id`
    New { parent_id: String, title: String },
    /// Replace the content of an existing object, keeping its id
    Replace { id: String },
}

/// Trait for ID-addressed hierarchical object stores
///
/// This trait is implemented by the drive adapter and the in-memory store,
/// and can be mocked for testing. Every call goes to the store; nothing is
/// cached on this side.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Get metadata for one object
    async fn get_metadata(&self, id: &str) -> Result<RemoteObject>;

    /// List the immediate children of a folder, trashed objects excluded
    async fn list_children(&self, parent_id: &str) -> Result<Vec<RemoteObject>>;

    /// Find children of `parent_id` titled `title`
    ///
    /// May return more than one object; callers decide whether that is an error.
    async fn find_by_title(
        &self,
        parent_id: &str,
        title: &str,
        filter: TypeFilter,
    ) -> Result<Vec<RemoteObject>> {
        let children = self.list_children(parent_id).await?;
        Ok(children
            .into_iter()
            .filter(|c| c.title == title && filter.accepts(c.kind))
            .collect())
    }

    /// Create a folder and return its id
    async fn create_folder(&self, parent_id: &str, title: &str) -> Result<String>;

    /// Upload a local file and return the id of the written object
    async fn upload_content(&self, target: UploadTarget, local_path: &Path) -> Result<String>;

    /// Download an object's content into `local_path`, replacing any existing file
    async fn download_content(&self, id: &str, local_path: &Path) -> Result<()>;

    /// Move an object to the trash
    async fn trash(&self, id: &str) -> Result<()>;

    /// Delete an object permanently
    async fn delete(&self, id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_object_file() {
        let obj = RemoteObject::file("f1", "test.txt", "root", 1024);
        assert_eq!(obj.title, "test.txt");
        assert_eq!(obj.size_bytes, 1024);
        assert_eq!(obj.parent_id(), Some("root"));
        assert!(!obj.is_folder());
        assert_eq!(obj.size_human(), "1 KiB");
    }

    #[test]
    fn test_remote_object_folder() {
        let obj = RemoteObject::folder("d1", "docs", "root");
        assert!(obj.is_folder());
        assert_eq!(obj.size_bytes, 0);
    }

    #[test]
    fn test_type_filter_accepts() {
        assert!(TypeFilter::Folder.accepts(ObjectKind::Folder));
        assert!(!TypeFilter::Folder.accepts(ObjectKind::File));
        assert!(TypeFilter::NotFolder.accepts(ObjectKind::File));
        assert!(!TypeFilter::NotFolder.accepts(ObjectKind::Folder));
        assert!(TypeFilter::Any.accepts(ObjectKind::Folder));
        assert!(TypeFilter::Any.accepts(ObjectKind::File));
    }

    #[test]
    fn test_kind_marker() {
        assert_eq!(ObjectKind::Folder.marker(), 'D');
        assert_eq!(ObjectKind::File.marker(), 'F');
    }
}
