//! Action logging.
//!
//! Every pipeline action is emitted as a tracing event and appended to a
//! plain-text log file as `[YYYY-MM-DD HH:MM:SS] <Action>: <message>` (UTC).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use reelsync_drive::{DriveError, WalkObserver};
use reelsync_models::{ItemId, RemoteEntry};

use crate::config::DEFAULT_ACTION_LOG_FILE;
use crate::error::PipelineError;

/// Categories written to the action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Download,
    DownloadError,
    FoundVideo,
    FolderCheck,
    FolderListingError,
    Authentication,
    UploadStart,
    Upload,
    Cleanup,
    CleanupError,
    Error,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Download => "Download",
            Action::DownloadError => "Download Error",
            Action::FoundVideo => "Found Video",
            Action::FolderCheck => "Folder Check",
            Action::FolderListingError => "Folder Listing Error",
            Action::Authentication => "Authentication",
            Action::UploadStart => "Upload Start",
            Action::Upload => "Upload",
            Action::Cleanup => "Cleanup",
            Action::CleanupError => "Cleanup Error",
            Action::Error => "Error",
        }
    }

    fn is_failure(&self) -> bool {
        matches!(
            self,
            Action::DownloadError
                | Action::FolderListingError
                | Action::CleanupError
                | Action::Error
        )
    }
}

/// Append-only action log.
#[derive(Debug, Clone)]
pub struct ActionLog {
    path: PathBuf,
}

impl ActionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log file named by `ACTION_LOG_FILE`, for use before the full
    /// configuration is available.
    pub fn from_env() -> Self {
        let path = std::env::var("ACTION_LOG_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ACTION_LOG_FILE.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one action.
    ///
    /// A failure to write the file is reported through tracing only.
    pub fn record(&self, action: Action, message: &str) {
        if action.is_failure() {
            error!(action = action.label(), "{}", message);
        } else {
            info!(action = action.label(), "{}", message);
        }

        let line = format_line(Utc::now(), action, message);
        if let Err(e) = self.append(&line) {
            warn!(
                path = %self.path.display(),
                "Error writing to log file: {}", e
            );
        }
    }

    /// Record an error under its own category.
    pub fn record_error(&self, error: &PipelineError) {
        self.record(error.action(), &error.to_string());
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

pub fn format_line(at: DateTime<Utc>, action: Action, message: &str) -> String {
    format!(
        "[{}] {}: {}",
        at.format("%Y-%m-%d %H:%M:%S"),
        action.label(),
        message
    )
}

impl WalkObserver for ActionLog {
    fn folder_entered(&self, folder: &RemoteEntry) {
        self.record(
            Action::FolderCheck,
            &format!("Checking folder: {}", folder.name),
        );
    }

    fn video_found(&self, entry: &RemoteEntry) {
        self.record(
            Action::FoundVideo,
            &format!("Found video file: {}", entry.name),
        );
    }

    fn video_downloaded(&self, entry: &RemoteEntry, _path: &Path, _bytes: u64) {
        self.record(
            Action::Download,
            &format!("File \"{}\" downloaded successfully", entry.name),
        );
    }

    fn listing_failed(&self, folder_id: &ItemId, error: &DriveError) {
        self.record_error(&PipelineError::remote_listing(format!(
            "Failed to list folder {}: {}",
            folder_id, error
        )));
    }

    fn download_failed(&self, entry: &RemoteEntry, error: &DriveError) {
        self.record_error(&PipelineError::download(format!(
            "Failed to download \"{}\" (ID {}): {}",
            entry.name, entry.id, error
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_line() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            format_line(at, Action::FoundVideo, "Found video file: clip.mov"),
            "[2024-03-09 07:05:01] Found Video: Found video file: clip.mov"
        );
    }

    #[test]
    fn test_record_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActionLog::new(dir.path().join("actions.log"));

        log.record(Action::UploadStart, "Uploading video: clip.mov");
        log.record(Action::Upload, "Video uploaded successfully: abc");

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] Upload Start: Uploading video: clip.mov"));
        assert!(lines[1].ends_with("] Upload: Video uploaded successfully: abc"));
    }

    #[test]
    fn test_unwritable_log_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActionLog::new(dir.path().join("missing").join("actions.log"));
        log.record(Action::Error, "still running");
        assert!(!log.path().exists());
    }

    #[test]
    fn test_walk_events_use_categories() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActionLog::new(dir.path().join("actions.log"));

        log.listing_failed(&ItemId::from("f1"), &DriveError::listing_failed("503"));
        log.download_failed(
            &RemoteEntry::file("v1", "clip.mp4"),
            &DriveError::download_failed("200 OK"),
        );

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("] Folder Listing Error: Failed to list folder f1"));
        assert!(contents.contains("] Download Error: Failed to download \"clip.mp4\" (ID v1)"));
    }
}
