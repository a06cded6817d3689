//! Drive client implementation
//!
//! Speaks the Drive v2 REST API over reqwest and implements the RemoteStore
//! trait from gd-core. Every request carries the bearer token and
//! `supportsAllDrives=true`.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use gd_core::{Error, RemoteObject, RemoteStore, Result, TypeFilter, UploadTarget};

use crate::multipart::RelatedBody;
use crate::types::{ErrorBody, FOLDER_MIME_TYPE, FileList, FileResource, NewFile, ParentReference};

/// Base URL of the Drive v2 metadata API
const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v2";

/// Base URL of the Drive v2 upload API
const UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v2";

/// Page size for `files.list`
const PAGE_SIZE: &str = "1000";

/// Fields requested for single files
const FILE_FIELDS: &str = "id,title,mimeType,parents(id),fileSize,modifiedDate";

/// Drive v2 client
pub struct DriveClient {
    client: Client,
    base_url: String,
    upload_url: String,
    access_token: String,
}

impl DriveClient {
    /// Create a client for the public Drive API
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DRIVE_BASE_URL.to_string(),
            upload_url: UPLOAD_BASE_URL.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Create a client with custom base URLs (useful for testing)
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: &str,
        upload_url: &str,
    ) -> Result<Self> {
        Url::parse(base_url)?;
        Url::parse(upload_url)?;
        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            upload_url: upload_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .query(&[("supportsAllDrives", "true")])
    }

    fn files_url(&self, id: &str) -> String {
        format!("{}/files/{id}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        check_status(response).await
    }

    async fn send_json<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| Error::Network(format!("Invalid response: {e}")))
    }

    /// Run a `files.list` query, following every page
    async fn list_query(&self, query: &str) -> Result<Vec<RemoteObject>> {
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;
        let fields = format!("nextPageToken,items({FILE_FIELDS})");

        loop {
            let mut request = self
                .request(Method::GET, format!("{}/files", self.base_url))
                .query(&[
                    ("q", query),
                    ("maxResults", PAGE_SIZE),
                    ("includeItemsFromAllDrives", "true"),
                    ("fields", fields.as_str()),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: FileList = self.send_json(request).await?;
            debug!(query, items = page.items.len(), "Listed page");
            objects.extend(page.items.into_iter().map(RemoteObject::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(objects)
    }
}

#[async_trait]
impl RemoteStore for DriveClient {
    async fn get_metadata(&self, id: &str) -> Result<RemoteObject> {
        debug!(id, "Fetching metadata");
        let file: FileResource = self
            .send_json(
                self.request(Method::GET, self.files_url(id))
                    .query(&[("fields", FILE_FIELDS)]),
            )
            .await?;
        Ok(file.into())
    }

    async fn list_children(&self, parent_id: &str) -> Result<Vec<RemoteObject>> {
        self.list_query(&children_query(parent_id)).await
    }

    async fn find_by_title(
        &self,
        parent_id: &str,
        title: &str,
        filter: TypeFilter,
    ) -> Result<Vec<RemoteObject>> {
        self.list_query(&title_query(parent_id, title, filter)).await
    }

    async fn create_folder(&self, parent_id: &str, title: &str) -> Result<String> {
        debug!(parent_id, title, "Creating folder");
        let body = NewFile {
            title,
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: vec![ParentReference {
                id: parent_id.to_string(),
            }],
        };
        let file: FileResource = self
            .send_json(
                self.request(Method::POST, format!("{}/files", self.base_url))
                    .json(&body),
            )
            .await?;
        Ok(file.id)
    }

    async fn upload_content(&self, target: UploadTarget, local_path: &Path) -> Result<String> {
        let content = tokio::fs::read(local_path).await?;
        let mime = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string();

        let request = match &target {
            UploadTarget::New { parent_id, title } => {
                let metadata = NewFile {
                    title,
                    mime_type: Some(&mime),
                    parents: vec![ParentReference {
                        id: parent_id.clone(),
                    }],
                };
                let related = RelatedBody::new(&metadata, &content, &mime)?;
                self.request(Method::POST, format!("{}/files", self.upload_url))
                    .query(&[("uploadType", "multipart")])
                    .header(reqwest::header::CONTENT_TYPE, related.content_type)
                    .body(related.body)
            }
            UploadTarget::Replace { id } => self
                .request(Method::PUT, format!("{}/files/{id}", self.upload_url))
                .query(&[("uploadType", "media")])
                .header(reqwest::header::CONTENT_TYPE, mime)
                .body(content),
        };
        debug!(?target, path = %local_path.display(), "Uploading content");

        let file: FileResource = self.send_json(request).await?;
        Ok(file.id)
    }

    async fn download_content(&self, id: &str, local_path: &Path) -> Result<()> {
        debug!(id, path = %local_path.display(), "Downloading content");
        let response = self
            .send(
                self.request(Method::GET, self.files_url(id))
                    .query(&[("alt", "media")]),
            )
            .await?;

        // Stream next to the target and rename over it only once complete;
        // the staging file is removed on any error
        let dir = match local_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut builder = tempfile::Builder::new();
        builder.prefix(".gd-download-");
        #[cfg(unix)]
        {
            // regular file mode, subject to the umask
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let staging = builder.tempfile_in(dir)?;
        let (std_file, staging_path) = staging.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Network(e.to_string()))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        staging_path.persist(local_path).map_err(|e| e.error)?;
        Ok(())
    }

    async fn trash(&self, id: &str) -> Result<()> {
        debug!(id, "Trashing");
        self.send(self.request(Method::POST, format!("{}/trash", self.files_url(id))))
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        debug!(id, "Deleting");
        self.send(self.request(Method::DELETE, self.files_url(id)))
            .await?;
        Ok(())
    }
}

/// Map a non-success status to a core error
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or(text);

    Err(match status {
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(message),
        _ => Error::Network(format!("HTTP {status}: {message}")),
    })
}

/// Escape a value for a single-quoted `q` string
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// `q` string listing the visible children of a folder
pub fn children_query(parent_id: &str) -> String {
    format!(
        "'{}' in parents and trashed = false",
        escape_query_value(parent_id)
    )
}

/// `q` string finding children of a folder by exact title
pub fn title_query(parent_id: &str, title: &str, filter: TypeFilter) -> String {
    let mut query = format!(
        "{} and title = '{}'",
        children_query(parent_id),
        escape_query_value(title)
    );
    match filter {
        TypeFilter::Folder => query.push_str(&format!(" and mimeType = '{FOLDER_MIME_TYPE}'")),
        TypeFilter::NotFolder => query.push_str(&format!(" and mimeType != '{FOLDER_MIME_TYPE}'")),
        TypeFilter::Any => {}
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_query_value() {
        assert_eq!(escape_query_value("plain"), "plain");
        assert_eq!(escape_query_value("it's"), "it\\'s");
        assert_eq!(escape_query_value("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_title_query() {
        assert_eq!(
            title_query("root", "it's", TypeFilter::Folder),
            "'root' in parents and trashed = false and title = 'it\\'s' \
             and mimeType = 'application/vnd.google-apps.folder'"
        );
        assert_eq!(
            title_query("p", "a.txt", TypeFilter::Any),
            "'p' in parents and trashed = false and title = 'a.txt'"
        );
        assert!(title_query("p", "a", TypeFilter::NotFolder).ends_with(
            "mimeType != 'application/vnd.google-apps.folder'"
        ));
    }

    #[test]
    fn test_with_base_url_rejects_garbage() {
        assert!(DriveClient::with_base_url("t", "not a url", "http://x").is_err());
        assert!(DriveClient::with_base_url("t", "http://x/", "http://y").is_ok());
    }
}
