//! Local staging directory for downloaded videos.
//!
//! Only regular files whose name contains a `.` are considered staged, so a
//! bare `.mp4` counts. Subdirectories, dotless names and unfinished
//! `*.part` downloads are left alone.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use reelsync_drive::PARTIAL_SUFFIX;

/// Result of clearing the staging directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub removed: Vec<PathBuf>,
    /// Files that could not be removed, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

pub async fn ensure_dir(dir: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(dir).await
}

pub async fn exists(dir: &Path) -> bool {
    tokio::fs::metadata(dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Staged files, sorted by name.
pub async fn staged_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let is_file = entry.file_type().await?.is_file();
        if is_file && is_staged_name(&entry.file_name().to_string_lossy()) {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

fn is_staged_name(name: &str) -> bool {
    name.contains('.') && !name.ends_with(PARTIAL_SUFFIX)
}

/// Delete every staged file. A missing directory counts as already clean.
pub async fn clear(dir: &Path) -> io::Result<CleanupOutcome> {
    let files = match staged_files(dir).await {
        Ok(files) => files,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CleanupOutcome::default()),
        Err(e) => return Err(e),
    };

    Ok(remove_files(files).await)
}

/// Remove each path, collecting the ones that could not be removed.
pub async fn remove_files(paths: Vec<PathBuf>) -> CleanupOutcome {
    let mut outcome = CleanupOutcome::default();
    for path in paths {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed staged file");
                outcome.removed.push(path);
            }
            Err(e) => outcome.failures.push((path, e.to_string())),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_staged_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"b").unwrap();
        std::fs::write(dir.path().join("a.mov"), b"a").unwrap();
        std::fs::write(dir.path().join("README"), b"r").unwrap();
        std::fs::create_dir(dir.path().join("nested.dir")).unwrap();

        let files = staged_files(dir.path()).await.unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.mov"), dir.path().join("b.mp4")]
        );
    }

    #[tokio::test]
    async fn test_clear_removes_staged_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"v").unwrap();
        std::fs::write(dir.path().join("keep"), b"k").unwrap();

        let outcome = clear(dir.path()).await.unwrap();

        assert_eq!(outcome.removed, vec![dir.path().join("clip.mp4")]);
        assert!(outcome.failures.is_empty());
        assert!(dir.path().join("keep").exists());
    }

    #[tokio::test]
    async fn test_bare_extension_is_staged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".mp4"), b"v").unwrap();

        assert_eq!(
            staged_files(dir.path()).await.unwrap(),
            vec![dir.path().join(".mp4")]
        );

        let outcome = clear(dir.path()).await.unwrap();
        assert_eq!(outcome.removed, vec![dir.path().join(".mp4")]);
        assert!(!dir.path().join(".mp4").exists());
    }

    #[tokio::test]
    async fn test_partial_downloads_are_not_staged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mov"), b"v").unwrap();
        std::fs::write(dir.path().join("next.mov.part"), b"half").unwrap();

        assert_eq!(
            staged_files(dir.path()).await.unwrap(),
            vec![dir.path().join("clip.mov")]
        );

        clear(dir.path()).await.unwrap();
        assert!(dir.path().join("next.mov.part").exists());
    }

    #[test]
    fn test_staged_names() {
        assert!(is_staged_name("clip.MP4"));
        assert!(is_staged_name(".mp4"));
        assert!(is_staged_name("archive.tar.gz"));
        assert!(!is_staged_name("README"));
        assert!(!is_staged_name("clip.mp4.part"));
    }

    #[tokio::test]
    async fn test_remove_files_collects_failures() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.mp4");
        let gone = dir.path().join("gone.mp4");
        std::fs::write(&present, b"v").unwrap();

        let outcome = remove_files(vec![present.clone(), gone.clone()]).await;

        assert_eq!(outcome.removed, vec![present]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, gone);
    }

    #[tokio::test]
    async fn test_clear_empty_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(clear(dir.path()).await.unwrap(), CleanupOutcome::default());

        let missing = dir.path().join("gone");
        assert_eq!(clear(&missing).await.unwrap(), CleanupOutcome::default());
        assert!(!exists(&missing).await);
    }
}
