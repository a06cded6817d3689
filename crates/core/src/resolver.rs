//! Path resolution
//!
//! Translates slash paths into chains of remote object ids by looking each
//! title up under the previous segment's id. Nothing is cached: every call
//! asks the store again.

use tracing::debug;

use crate::error::{Error, Result};
use crate::path::{self, Anchor, DrivePath};
use crate::traits::{RemoteStore, TypeFilter};

/// Upper bound on parent hops while rendering a path, guards against cycles
const MAX_DEPTH: usize = 1024;

/// Outcome of looking up the last segment of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    /// The object exists
    Found(String),
    /// No non-folder object with that title exists under the parent
    Missing,
}

/// Ids of every segment of a resolved path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdChain {
    base: String,
    segments: Vec<String>,
    folders: Vec<String>,
    terminal: Terminal,
    created: usize,
}

impl IdChain {
    fn base_only(base: String) -> Self {
        Self {
            terminal: Terminal::Found(base.clone()),
            base,
            segments: Vec::new(),
            folders: Vec::new(),
            created: 0,
        }
    }

    /// One id per path segment; `[base]` for an empty path
    ///
    /// A missing terminal contributes no id.
    pub fn ids(&self) -> Vec<&str> {
        if self.segments.is_empty() {
            return vec![self.base.as_str()];
        }
        let mut ids: Vec<&str> = self.folders.iter().map(String::as_str).collect();
        if let Terminal::Found(id) = &self.terminal {
            ids.push(id);
        }
        ids
    }

    /// The terminal lookup result
    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    /// Id of the last segment, if it exists
    pub fn id(&self) -> Option<&str> {
        match &self.terminal {
            Terminal::Found(id) => Some(id),
            Terminal::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.terminal == Terminal::Missing
    }

    /// Id of the folder holding the last segment
    pub fn parent_id(&self) -> &str {
        self.folders.last().unwrap_or(&self.base)
    }

    /// Title of the last segment, `None` for an empty path
    pub fn title(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The resolved titles joined with `/`, relative to the base
    pub fn relative_path(&self) -> String {
        self.segments.join("/")
    }

    /// Id of the folder resolution started from
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Number of folders created while resolving
    pub fn created(&self) -> usize {
        self.created
    }
}

/// A slash path rendered back from an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPath {
    /// Titles from the home folder down, joined with `/` (empty for home)
    pub path: String,
    /// Ids from the home folder down, home first
    pub ids: Vec<String>,
}

/// Resolves paths against a store, relative to a home and a working folder
pub struct Resolver<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    home_id: String,
    working_id: String,
}

impl<'a, S: RemoteStore + ?Sized> Resolver<'a, S> {
    /// Create a resolver whose working folder is the home folder
    pub fn new(store: &'a S, home_id: impl Into<String>) -> Self {
        let home_id = home_id.into();
        Self {
            store,
            working_id: home_id.clone(),
            home_id,
        }
    }

    /// Resolve relative paths against `working_id` instead of home
    pub fn relative_to(mut self, working_id: impl Into<String>) -> Self {
        self.working_id = working_id.into();
        self
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn home_id(&self) -> &str {
        &self.home_id
    }

    pub fn working_id(&self) -> &str {
        &self.working_id
    }

    /// Resolve `path` into an id chain
    ///
    /// Non-terminal segments must be folders; the last one must pass
    /// `terminal`. Missing folders are created when `create_missing` is set.
    /// A missing last segment with `TypeFilter::NotFolder` is reported as
    /// [`Terminal::Missing`] rather than an error.
    pub async fn resolve(
        &self,
        path: &str,
        create_missing: bool,
        terminal: TypeFilter,
    ) -> Result<IdChain> {
        let parsed = DrivePath::parse(path);
        let base = self.base_id(&parsed).await?;
        debug!(path, base = %base, "Resolving path");
        self.resolve_from(&base, parsed.segments, create_missing, terminal)
            .await
    }

    /// Resolve a path that must already exist, folder or not
    ///
    /// Tries a folder first and falls back to a non-folder. Ambiguity is
    /// never resolved by the fallback.
    pub async fn resolve_existing(&self, path: &str) -> Result<IdChain> {
        match self.resolve(path, false, TypeFilter::Folder).await {
            Ok(chain) => Ok(chain),
            Err(Error::PathNotFound { .. }) => {
                let chain = self.resolve(path, false, TypeFilter::NotFolder).await?;
                if chain.is_missing() {
                    let parsed = DrivePath::parse(path);
                    let (last, rest) = parsed
                        .segments
                        .split_last()
                        .map(|(l, r)| (l.clone(), r.join("/")))
                        .unwrap_or_default();
                    return Err(Error::PathNotFound {
                        segment: last,
                        parent: rest,
                    });
                }
                Ok(chain)
            }
            Err(e) => Err(e),
        }
    }

    /// Render the path of `id` relative to the home folder
    pub async fn path_of(&self, id: &str) -> Result<RenderedPath> {
        let home = self.store.get_metadata(&self.home_id).await?;
        let mut titles = Vec::new();
        let mut ids = Vec::new();
        let mut current = id.to_string();

        while current != self.home_id && current != home.id {
            if ids.len() >= MAX_DEPTH {
                return Err(Error::General(format!(
                    "Parent chain of {id} is deeper than {MAX_DEPTH} levels"
                )));
            }
            let object = self.store.get_metadata(&current).await?;
            let parent = object.parent_id().map(str::to_string);
            titles.push(object.title);
            ids.push(current);
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }

        ids.push(self.home_id.clone());
        titles.reverse();
        ids.reverse();
        Ok(RenderedPath {
            path: titles.join("/"),
            ids,
        })
    }

    /// Id of the parent of `id`, staying at home when already there
    pub async fn parent_of(&self, id: &str) -> Result<String> {
        let rendered = self.path_of(id).await?;
        let ids = rendered.ids;
        if ids.len() > 1 {
            Ok(ids[ids.len() - 2].clone())
        } else {
            Ok(ids[0].clone())
        }
    }

    async fn base_id(&self, parsed: &DrivePath) -> Result<String> {
        let mut base = match parsed.anchor {
            Anchor::Home => self.home_id.clone(),
            Anchor::Working => self.working_id.clone(),
        };
        for _ in 0..parsed.up {
            base = self.parent_of(&base).await?;
        }
        Ok(base)
    }

    /// Resolve literal titles below the folder `base`
    ///
    /// No prefix handling: `~`, `..` and quotes are plain titles here.
    pub async fn resolve_from(
        &self,
        base: &str,
        segments: Vec<String>,
        create_missing: bool,
        terminal: TypeFilter,
    ) -> Result<IdChain> {
        let base = base.to_string();
        if segments.is_empty() {
            return Ok(IdChain::base_only(base));
        }

        let mut folders: Vec<String> = Vec::with_capacity(segments.len());
        let mut created = 0;
        let last = segments.len() - 1;

        for (i, title) in segments.iter().enumerate() {
            let parent = folders.last().unwrap_or(&base).clone();
            let filter = if i == last {
                terminal
            } else {
                TypeFilter::Folder
            };

            let mut matches = self.store.find_by_title(&parent, title, filter).await?;
            let id = match matches.len() {
                1 => matches.remove(0).id,
                0 if i == last && terminal == TypeFilter::NotFolder => {
                    debug!(title = %title, "Terminal file not found");
                    return Ok(IdChain {
                        base,
                        segments,
                        folders,
                        terminal: Terminal::Missing,
                        created,
                    });
                }
                0 if create_missing => {
                    path::validate_title(title)?;
                    debug!(title = %title, parent = %parent, "Creating missing folder");
                    created += 1;
                    self.store.create_folder(&parent, title).await?
                }
                0 => {
                    return Err(Error::PathNotFound {
                        segment: title.clone(),
                        parent: segments[..i].join("/"),
                    });
                }
                _ => {
                    return Err(Error::AmbiguousName {
                        name: title.clone(),
                        parent: segments[..i].join("/"),
                    });
                }
            };

            if i == last {
                return Ok(IdChain {
                    base,
                    segments,
                    folders,
                    terminal: Terminal::Found(id),
                    created,
                });
            }
            folders.push(id);
        }

        unreachable!("loop returns on the last segment")
    }
}
