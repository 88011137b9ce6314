//! On-disk credential cache.
//!
//! One JSON file per service. Writes go to a temporary sibling first and are
//! renamed into place, so a reader never sees a half-written record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use reelsync_models::CredentialRecord;

use crate::error::{AuthError, AuthResult};

/// File-backed store for a single service's credentials.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record.
    ///
    /// Returns `Ok(None)` when no file exists yet.
    pub async fn load(&self) -> AuthResult<Option<CredentialRecord>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::from(e)),
        };

        let record = serde_json::from_str(&raw).map_err(|e| {
            AuthError::store(format!("{} is not a valid token file: {}", self.path.display(), e))
        })?;

        debug!("Loaded credentials from {}", self.path.display());
        Ok(Some(record))
    }

    /// Replace the persisted record.
    pub async fn save(&self, record: &CredentialRecord) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(record)?;
        let tmp_path = self.tmp_path();

        fs::write(&tmp_path, json).await?;
        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            fs::remove_file(&tmp_path).await.ok();
            return Err(AuthError::store(format!(
                "Failed to move token file into place at {}: {}",
                self.path.display(),
                e
            )));
        }

        debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
