//! In-memory RemoteStore
//!
//! A complete, process-local implementation of [`RemoteStore`]. Titles are
//! not unique, trash hides objects from listings, and uploads read the local
//! file for real. Useful for tests and for exercising the engine without a
//! network session.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::traits::{ObjectKind, RemoteObject, RemoteStore, UploadTarget};

/// Default id of the root folder
pub const ROOT_ID: &str = "root";

/// Default title of the root folder
pub const ROOT_TITLE: &str = "My Drive";

#[derive(Debug)]
struct Node {
    object: RemoteObject,
    content: Vec<u8>,
    trashed: bool,
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    next_id: u64,
    failing_titles: HashSet<String>,
    folders_created: usize,
    uploads: usize,
}

impl State {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("id-{}", self.next_id)
    }

    fn insert(&mut self, object: RemoteObject, content: Vec<u8>) -> String {
        let id = object.id.clone();
        self.nodes.insert(
            id.clone(),
            Node {
                object,
                content,
                trashed: false,
            },
        );
        id
    }

    fn node(&self, id: &str) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("object {id}")))
    }

    fn folder(&self, id: &str) -> Result<&Node> {
        let node = self.node(id)?;
        if !node.object.is_folder() {
            return Err(Error::Conflict(format!("{id} is not a folder")));
        }
        Ok(node)
    }

    fn descendants(&self, id: &str) -> Vec<String> {
        let mut found = vec![id.to_string()];
        let mut i = 0;
        while i < found.len() {
            let current = found[i].clone();
            for (child_id, node) in &self.nodes {
                if node.object.parent_id() == Some(current.as_str()) {
                    found.push(child_id.clone());
                }
            }
            i += 1;
        }
        found
    }
}

/// Process-local object store
#[derive(Debug)]
pub struct MemoryStore {
    root_id: String,
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create a store holding only an empty root folder
    pub fn new() -> Self {
        Self::with_root(ROOT_ID, ROOT_TITLE)
    }

    /// Create a store with a custom root id and title
    pub fn with_root(id: impl Into<String>, title: impl Into<String>) -> Self {
        let root_id = id.into();
        let mut state = State::default();
        state.insert(
            RemoteObject {
                id: root_id.clone(),
                title: title.into(),
                kind: ObjectKind::Folder,
                parent_ids: Vec::new(),
                size_bytes: 0,
                modified: None,
            },
            Vec::new(),
        );
        Self {
            root_id,
            state: Mutex::new(state),
        }
    }

    /// Id of the root folder
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a folder without any uniqueness check
    pub fn add_folder(&self, parent_id: &str, title: &str) -> String {
        let mut state = self.lock();
        let id = state.allocate_id();
        state.insert(RemoteObject::folder(&id, title, parent_id), Vec::new())
    }

    /// Add a file with the given content without any uniqueness check
    pub fn add_file(&self, parent_id: &str, title: &str, content: &[u8]) -> String {
        let mut state = self.lock();
        let id = state.allocate_id();
        state.insert(
            RemoteObject::file(&id, title, parent_id, content.len() as u64),
            content.to_vec(),
        )
    }

    /// Make every upload of an object with this title fail
    pub fn fail_uploads_of(&self, title: &str) {
        self.lock().failing_titles.insert(title.to_string());
    }

    /// Content of a file, if it exists
    pub fn content(&self, id: &str) -> Option<Vec<u8>> {
        self.lock().nodes.get(id).map(|n| n.content.clone())
    }

    /// Titles of the visible children of a folder, sorted
    pub fn child_titles(&self, parent_id: &str) -> Vec<String> {
        let state = self.lock();
        let mut titles: Vec<String> = state
            .nodes
            .values()
            .filter(|n| !n.trashed && n.object.parent_id() == Some(parent_id))
            .map(|n| n.object.title.clone())
            .collect();
        titles.sort();
        titles
    }

    /// Whether the object is in the trash
    pub fn is_trashed(&self, id: &str) -> bool {
        self.lock().nodes.get(id).is_some_and(|n| n.trashed)
    }

    /// Whether the object exists (trashed or not)
    pub fn exists(&self, id: &str) -> bool {
        self.lock().nodes.contains_key(id)
    }

    /// Number of folders created through [`RemoteStore::create_folder`]
    pub fn folders_created(&self) -> usize {
        self.lock().folders_created
    }

    /// Number of successful uploads
    pub fn uploads(&self) -> usize {
        self.lock().uploads
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get_metadata(&self, id: &str) -> Result<RemoteObject> {
        Ok(self.lock().node(id)?.object.clone())
    }

    async fn list_children(&self, parent_id: &str) -> Result<Vec<RemoteObject>> {
        let state = self.lock();
        state.folder(parent_id)?;
        Ok(state
            .nodes
            .values()
            .filter(|n| !n.trashed && n.object.parent_id() == Some(parent_id))
            .map(|n| n.object.clone())
            .collect())
    }

    async fn create_folder(&self, parent_id: &str, title: &str) -> Result<String> {
        let mut state = self.lock();
        state.folder(parent_id)?;
        let id = state.allocate_id();
        state.folders_created += 1;
        Ok(state.insert(RemoteObject::folder(&id, title, parent_id), Vec::new()))
    }

    async fn upload_content(&self, target: UploadTarget, local_path: &Path) -> Result<String> {
        let content = tokio::fs::read(local_path).await?;
        let mut state = self.lock();

        let title = match &target {
            UploadTarget::New { title, .. } => title.clone(),
            UploadTarget::Replace { id } => state.node(id)?.object.title.clone(),
        };
        if state.failing_titles.contains(&title) {
            return Err(Error::Network(format!("upload of '{title}' rejected")));
        }

        let id = match target {
            UploadTarget::New { parent_id, title } => {
                state.folder(&parent_id)?;
                let id = state.allocate_id();
                state.insert(
                    RemoteObject::file(&id, title, parent_id, content.len() as u64),
                    content,
                )
            }
            UploadTarget::Replace { id } => {
                let node = state
                    .nodes
                    .get_mut(&id)
                    .ok_or_else(|| Error::NotFound(format!("object {id}")))?;
                node.object.size_bytes = content.len() as u64;
                node.content = content;
                id
            }
        };
        state.uploads += 1;
        Ok(id)
    }

    async fn download_content(&self, id: &str, local_path: &Path) -> Result<()> {
        let content = {
            let state = self.lock();
            let node = state.node(id)?;
            if node.object.is_folder() {
                return Err(Error::Conflict(format!("{id} is a folder")));
            }
            node.content.clone()
        };
        tokio::fs::write(local_path, content).await?;
        Ok(())
    }

    async fn trash(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        let node = state
            .nodes
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("object {id}")))?;
        node.trashed = true;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        state.node(id)?;
        for doomed in state.descendants(id) {
            state.nodes.remove(&doomed);
        }
        Ok(())
    }
}
