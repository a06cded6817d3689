//! Drive v2 wire types

use gd_core::{ObjectKind, RemoteObject};
use serde::{Deserialize, Serialize};

/// Mime type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Reference to a parent folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentReference {
    pub id: String,
}

/// A file resource as returned by `files.get` and `files.list`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResource {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub parents: Vec<ParentReference>,
    /// int64 encoded as a string
    #[serde(default)]
    pub file_size: Option<String>,
    #[serde(default)]
    pub modified_date: Option<String>,
}

impl From<FileResource> for RemoteObject {
    fn from(file: FileResource) -> Self {
        let kind = if file.mime_type == FOLDER_MIME_TYPE {
            ObjectKind::Folder
        } else {
            ObjectKind::File
        };
        RemoteObject {
            id: file.id,
            title: file.title,
            kind,
            parent_ids: file.parents.into_iter().map(|p| p.id).collect(),
            size_bytes: file
                .file_size
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            modified: file.modified_date.and_then(|d| d.parse().ok()),
        }
    }
}

/// One page of `files.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub items: Vec<FileResource>,
    pub next_page_token: Option<String>,
}

/// Metadata sent when creating a file or folder
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'a str>,
    pub parents: Vec<ParentReference>,
}

/// Error envelope of a failed request
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}
