//! Depth-first walk over a drive folder tree.
//!
//! The walk keeps an explicit stack of pending child lists instead of
//! recursing, so arbitrarily deep trees cannot exhaust the async stack. The
//! visiting order is the same as the recursive form: children are handled in
//! listing order and a folder's whole subtree is finished before its next
//! sibling.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use reelsync_models::{EntryKind, ItemId, RemoteEntry};

use crate::client::DriveApi;
use crate::error::{DriveError, DriveResult};

/// Receives walk events as they happen.
///
/// All methods default to no-ops.
pub trait WalkObserver: Send + Sync {
    fn folder_entered(&self, _folder: &RemoteEntry) {}

    fn video_found(&self, _entry: &RemoteEntry) {}

    fn video_downloaded(&self, _entry: &RemoteEntry, _path: &Path, _bytes: u64) {}

    fn listing_failed(&self, _folder_id: &ItemId, _error: &DriveError) {}

    fn download_failed(&self, _entry: &RemoteEntry, _error: &DriveError) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl WalkObserver for NoopObserver {}

/// Outcome of a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    pub folders_listed: usize,
    pub listing_failures: usize,
    pub videos_found: usize,
    pub videos_downloaded: usize,
    pub download_failures: usize,
    /// Local paths of successfully downloaded videos, in download order.
    pub staged: Vec<PathBuf>,
}

impl WalkReport {
    /// True when at least one video was discovered, whether or not its
    /// download succeeded.
    pub fn found_any_video(&self) -> bool {
        self.videos_found > 0
    }
}

/// Walks a folder tree and downloads every video into a staging directory.
pub struct TreeWalker<'a> {
    drive: &'a dyn DriveApi,
    staging_dir: PathBuf,
    observer: &'a dyn WalkObserver,
}

impl<'a> TreeWalker<'a> {
    pub fn new(drive: &'a dyn DriveApi, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            drive,
            staging_dir: staging_dir.into(),
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn WalkObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Walk the tree rooted at `folder_id`.
    ///
    /// Listing and download failures are reported to the observer and counted;
    /// they never stop the walk.
    pub async fn walk(&self, folder_id: &ItemId) -> WalkReport {
        let mut report = WalkReport::default();
        let mut visited = HashSet::from([folder_id.clone()]);
        let mut pending: Vec<VecDeque<RemoteEntry>> = Vec::new();

        if let Some(children) = self.list(folder_id, &mut report).await {
            pending.push(children);
        }

        while let Some(frame) = pending.last_mut() {
            let Some(entry) = frame.pop_front() else {
                pending.pop();
                continue;
            };

            match entry.kind {
                EntryKind::File if entry.is_video() => {
                    self.fetch_video(&entry, &mut report).await;
                }
                EntryKind::File => {
                    debug!(name = %entry.name, "Skipping non-video file");
                }
                EntryKind::Folder => {
                    if !visited.insert(entry.id.clone()) {
                        warn!(folder_id = %entry.id, "Folder already visited, skipping");
                        continue;
                    }
                    self.observer.folder_entered(&entry);
                    if let Some(children) = self.list(&entry.id, &mut report).await {
                        pending.push(children);
                    }
                }
                EntryKind::Other => {
                    debug!(name = %entry.name, "Skipping entry that is neither file nor folder");
                }
            }
        }

        report
    }

    async fn list(
        &self,
        folder_id: &ItemId,
        report: &mut WalkReport,
    ) -> Option<VecDeque<RemoteEntry>> {
        match self.drive.list_children(folder_id).await {
            Ok(children) => {
                report.folders_listed += 1;
                Some(children.into())
            }
            Err(e) => {
                report.listing_failures += 1;
                self.observer.listing_failed(folder_id, &e);
                None
            }
        }
    }

    async fn fetch_video(&self, entry: &RemoteEntry, report: &mut WalkReport) {
        self.observer.video_found(entry);
        report.videos_found += 1;

        let result = match self.staging_path(&entry.name) {
            Ok(path) => self
                .drive
                .download(&entry.id, &path)
                .await
                .map(|bytes| (path, bytes)),
            Err(e) => Err(e),
        };

        match result {
            Ok((path, bytes)) => {
                report.videos_downloaded += 1;
                self.observer.video_downloaded(entry, &path, bytes);
                report.staged.push(path);
            }
            Err(e) => {
                report.download_failures += 1;
                self.observer.download_failed(entry, &e);
            }
        }
    }

    /// Local path for a remote file name; only the final component is kept.
    fn staging_path(&self, name: &str) -> DriveResult<PathBuf> {
        let file_name = Path::new(name)
            .file_name()
            .ok_or_else(|| DriveError::invalid_response(format!("unusable file name: {name:?}")))?;
        Ok(self.staging_dir.join(file_name))
    }
}
