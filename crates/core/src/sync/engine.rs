use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::naming::first_free_copy_name;
use super::policy::{Action, Conflict, ConflictResolver, Direction, TransferPolicy};
use super::{CancelFlag, Outcome, SyncObserver, SyncReport};
use crate::enumerate::{Depth, Entry, enumerate_local, enumerate_remote};
use crate::error::{Error, Result};
use crate::path;
use crate::resolver::{Resolver, Terminal};
use crate::traits::{RemoteStore, TypeFilter, UploadTarget};

/// Phase of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// Resolving roots and enumerating the source tree
    Planning,
    Transferring,
    Done,
}

/// Runs upload and download batches against one store
pub struct SyncEngine<'a, S: RemoteStore + ?Sized> {
    resolver: &'a Resolver<'a, S>,
    conflicts: &'a dyn ConflictResolver,
    policy: TransferPolicy,
    observer: Option<&'a dyn SyncObserver>,
    cancel: CancelFlag,
    state: SyncState,
}

impl<'a, S: RemoteStore + ?Sized> SyncEngine<'a, S> {
    /// Create an engine that asks `conflicts` about every existing target
    pub fn new(resolver: &'a Resolver<'a, S>, conflicts: &'a dyn ConflictResolver) -> Self {
        Self {
            resolver,
            conflicts,
            policy: TransferPolicy::Ask,
            observer: None,
            cancel: CancelFlag::new(),
            state: SyncState::Idle,
        }
    }

    /// Start batches with `policy` instead of asking
    pub fn with_policy(mut self, policy: TransferPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn SyncObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Current batch policy, including sticky answers given so far
    pub fn policy(&self) -> TransferPolicy {
        self.policy
    }

    /// Upload `local_root` into the remote folder `remote_dest`
    ///
    /// A directory root is recreated under the destination with its own
    /// name; a file root is uploaded straight into it. Missing destination
    /// folders are created.
    pub async fn upload(&mut self, local_root: &Path, remote_dest: &str) -> Result<SyncReport> {
        self.set_state(SyncState::Planning);
        let listing = enumerate_local(local_root, Depth::All)?;
        let root_name = if local_root.is_dir() {
            Some(local_dir_name(local_root)?)
        } else {
            None
        };
        // Entry locations are checked relative to this for drive-safe names
        let absolute_root = std::path::absolute(local_root)?;
        let names_base = match &root_name {
            Some(_) => absolute_root.as_path(),
            None => absolute_root.parent().unwrap_or(&absolute_root),
        };

        let dest = self
            .resolver
            .resolve(remote_dest, true, TypeFilter::Folder)
            .await?;
        let dest_id = dest
            .id()
            .ok_or_else(|| Error::NotFound(remote_dest.to_string()))?
            .to_string();
        info!(
            source = %local_root.display(),
            dest = remote_dest,
            files = listing.non_folder_count,
            "Starting upload"
        );

        let mut report = SyncReport {
            total_files: listing.non_folder_count,
            folders_created: dest.created(),
            ..Default::default()
        };
        self.notify_started(report.total_files);
        self.set_state(SyncState::Transferring);

        for entry in &listing.entries {
            if self.cancel.is_cancelled() {
                warn!("Upload interrupted");
                report.interrupted = true;
                break;
            }

            let mut segments: Vec<String> = root_name.iter().cloned().collect();
            segments.extend(path::split_segments(&entry.path).map(String::from));
            let item = segments.join("/");

            let source = match local_source(entry, names_base) {
                Ok(source) => source,
                Err(e) => {
                    self.finish_item(&mut report, &item, Outcome::Failed(e.to_string()));
                    continue;
                }
            };

            let outcome = if entry.kind.is_folder() {
                match self
                    .resolver
                    .resolve_from(&dest_id, segments, true, TypeFilter::Folder)
                    .await
                {
                    Ok(chain) => {
                        report.folders_created += chain.created();
                        Outcome::Folder
                    }
                    Err(e) => Outcome::Failed(e.to_string()),
                }
            } else {
                let location = path::join(remote_dest, parent_of(&item));
                match self
                    .upload_file(&dest_id, segments, source, location)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(Error::Interrupted) => {
                        warn!("Upload interrupted");
                        report.interrupted = true;
                        break;
                    }
                    Err(e) => Outcome::Failed(e.to_string()),
                }
            };

            self.finish_item(&mut report, &item, outcome);
        }

        self.finish(&report);
        Ok(report)
    }

    /// Download the remote `remote_path` into the local directory `local_dest`
    ///
    /// A folder root is recreated under the destination with its own title;
    /// a file root is written straight into it.
    pub async fn download(&mut self, remote_path: &str, local_dest: &Path) -> Result<SyncReport> {
        self.set_state(SyncState::Planning);
        let store = self.resolver.store();
        let chain = self.resolver.resolve_existing(remote_path).await?;
        let root_id = chain
            .id()
            .ok_or_else(|| Error::NotFound(remote_path.to_string()))?
            .to_string();
        let root = store.get_metadata(&root_id).await?;
        let listing =
            enumerate_remote(self.resolver, remote_path, Some(root_id.as_str()), Depth::All).await?;
        info!(
            source = remote_path,
            dest = %local_dest.display(),
            files = listing.non_folder_count,
            "Starting download"
        );

        let mut report = SyncReport {
            total_files: listing.non_folder_count,
            ..Default::default()
        };

        let (base, prefix) = if root.is_folder() {
            let base = local_segment_path(local_dest, &root.title)?;
            if !base.exists() {
                report.folders_created += 1;
            }
            tokio::fs::create_dir_all(&base).await?;
            (base, root.title.clone())
        } else {
            tokio::fs::create_dir_all(local_dest).await?;
            (local_dest.to_path_buf(), String::new())
        };

        self.notify_started(report.total_files);
        self.set_state(SyncState::Transferring);

        for entry in &listing.entries {
            if self.cancel.is_cancelled() {
                warn!("Download interrupted");
                report.interrupted = true;
                break;
            }

            let item = path::join(&prefix, &entry.path);
            let outcome = match local_segment_path(&base, &entry.path) {
                Err(e) => Outcome::Failed(e.to_string()),
                Ok(target) if entry.kind.is_folder() => {
                    let existed = target.exists();
                    match tokio::fs::create_dir_all(&target).await {
                        Ok(()) => {
                            if !existed {
                                report.folders_created += 1;
                            }
                            Outcome::Folder
                        }
                        Err(e) => Outcome::Failed(e.to_string()),
                    }
                }
                Ok(target) => match self.download_file(entry, &target, &item).await {
                    Ok(outcome) => outcome,
                    Err(Error::Interrupted) => {
                        warn!("Download interrupted");
                        report.interrupted = true;
                        break;
                    }
                    Err(e) => Outcome::Failed(e.to_string()),
                },
            };

            self.finish_item(&mut report, &item, outcome);
        }

        self.finish(&report);
        Ok(report)
    }

    async fn upload_file(
        &mut self,
        dest_id: &str,
        segments: Vec<String>,
        local: &Path,
        location: String,
    ) -> Result<Outcome> {
        let item = segments.join("/");
        let chain = self
            .resolver
            .resolve_from(dest_id, segments, true, TypeFilter::NotFolder)
            .await?;
        let title = chain.title().unwrap_or_default().to_string();
        let parent_id = chain.parent_id().to_string();
        let store = self.resolver.store();

        let target = match chain.terminal() {
            Terminal::Missing => UploadTarget::New {
                parent_id,
                title: title.clone(),
            },
            Terminal::Found(existing) => {
                let conflict = Conflict {
                    direction: Direction::Upload,
                    path: item.clone(),
                    location,
                };
                match self.choose(&conflict).await? {
                    Action::Skip => {
                        info!(path = %item, "Skipping existing file");
                        return Ok(Outcome::Skipped);
                    }
                    Action::Overwrite => UploadTarget::Replace {
                        id: existing.clone(),
                    },
                    Action::CreateCopy => {
                        let siblings: HashSet<String> = store
                            .list_children(&parent_id)
                            .await?
                            .into_iter()
                            .map(|o| o.title)
                            .collect();
                        let copy = first_free_copy_name(&title, |c| siblings.contains(c));
                        UploadTarget::New {
                            parent_id,
                            title: copy,
                        }
                    }
                }
            }
        };

        let written = match &target {
            UploadTarget::New { title, .. } => title.clone(),
            UploadTarget::Replace { .. } => title,
        };
        debug!(path = %item, ?target, "Uploading");
        store.upload_content(target, local).await?;
        info!(path = %item, title = %written, "Uploaded");
        Ok(Outcome::Transferred(written))
    }

    async fn download_file(&mut self, entry: &Entry, target: &Path, item: &str) -> Result<Outcome> {
        let dir = target.parent().unwrap_or(Path::new("."));
        tokio::fs::create_dir_all(dir).await?;

        let mut dest = target.to_path_buf();
        if tokio::fs::try_exists(target).await? {
            let conflict = Conflict {
                direction: Direction::Download,
                path: item.to_string(),
                location: dir.display().to_string(),
            };
            match self.choose(&conflict).await? {
                Action::Skip => {
                    info!(path = %item, "Skipping existing file");
                    return Ok(Outcome::Skipped);
                }
                Action::Overwrite => {}
                Action::CreateCopy => {
                    let name = file_name_of(target);
                    let copy = first_free_copy_name(&name, |c| dir.join(c).exists());
                    dest = dir.join(copy);
                }
            }
        }

        debug!(path = %item, dest = %dest.display(), "Downloading");
        self.resolver
            .store()
            .download_content(&entry.id, &dest)
            .await?;
        let written = file_name_of(&dest);
        info!(path = %item, file = %written, "Downloaded");
        Ok(Outcome::Transferred(written))
    }

    async fn choose(&mut self, conflict: &Conflict) -> Result<Action> {
        if let Some(action) = self.policy.action() {
            return Ok(action);
        }
        let decision = self.conflicts.decide(conflict).await?;
        if decision.sticky {
            self.policy = decision.action.into();
            info!(policy = %self.policy, "Applying answer to the rest of the batch");
        }
        Ok(decision.action)
    }

    fn set_state(&mut self, state: SyncState) {
        debug!(from = ?self.state, to = ?state, "Sync state");
        self.state = state;
    }

    fn notify_started(&self, total_files: usize) {
        if let Some(observer) = self.observer {
            observer.started(total_files);
        }
    }

    fn finish_item(&self, report: &mut SyncReport, item: &str, outcome: Outcome) {
        if let Outcome::Failed(reason) = &outcome {
            warn!(path = %item, reason = %reason, "Transfer failed");
        }
        report.record(item, &outcome);
        if let Some(observer) = self.observer {
            observer.item_finished(item, &outcome);
        }
    }

    fn finish(&mut self, report: &SyncReport) {
        self.set_state(SyncState::Done);
        info!(
            transferred = report.transferred.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            interrupted = report.interrupted,
            "Batch finished"
        );
        if let Some(observer) = self.observer {
            observer.finished(report);
        }
    }
}

fn parent_of(item: &str) -> &str {
    item.rfind('/').map(|i| &item[..i]).unwrap_or("")
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Name of a local directory, following `.` and `..`
fn local_dir_name(dir: &Path) -> Result<String> {
    let canonical = std::fs::canonicalize(dir)?;
    let name = canonical
        .file_name()
        .ok_or_else(|| Error::InvalidPath(format!("Cannot upload '{}'", dir.display())))?;
    name.to_str()
        .map(str::to_string)
        .ok_or_else(|| not_a_title(&canonical))
}

/// Location on disk of a local entry whose names below `base` can all
/// become drive titles
fn local_source<'e>(entry: &'e Entry, base: &Path) -> Result<&'e Path> {
    let local = entry
        .local_path
        .as_deref()
        .ok_or_else(|| Error::General(format!("'{}' has no local location", entry.path)))?;
    let relative = local.strip_prefix(base).unwrap_or(local);
    if relative.components().any(|c| c.as_os_str().to_str().is_none()) {
        return Err(not_a_title(local));
    }
    Ok(local)
}

fn not_a_title(local: &Path) -> Error {
    Error::InvalidPath(format!(
        "'{}' has a name that is not valid UTF-8 and cannot become a drive title",
        local.display()
    ))
}

/// Append a remote relative path to a local directory
///
/// Titles that would leave the directory are rejected.
fn local_segment_path(base: &Path, relative: &str) -> Result<PathBuf> {
    let mut target = base.to_path_buf();
    for segment in path::split_segments(relative) {
        if segment == "." || segment == ".." {
            return Err(Error::InvalidPath(format!(
                "'{relative}' cannot be written below '{}'",
                base.display()
            )));
        }
        target.push(segment);
    }
    Ok(target)
}
