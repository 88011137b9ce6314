//! Video classification and upload metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Extensions recognized as video, compared case-insensitively.
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "avi", "mov", "mkv", "flv", "wmv"];

/// Check whether a file name ends with a recognized video extension.
///
/// `Video.MP4`, `video.mp4` and `VIDEO.Mp4` all match; a bare `mp4` does not.
pub fn is_video_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| {
        lower
            .strip_suffix(*ext)
            .is_some_and(|stem| stem.ends_with('.'))
    })
}

/// Visibility of an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    #[default]
    Private,
    Unlisted,
    Public,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Private => "private",
            Privacy::Unlisted => "unlisted",
            Privacy::Public => "public",
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Invalid privacy status '{0}', expected private, unlisted or public")]
pub struct ParsePrivacyError(pub String);

impl FromStr for Privacy {
    type Err = ParsePrivacyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(Privacy::Private),
            "unlisted" => Ok(Privacy::Unlisted),
            "public" => Ok(Privacy::Public),
            _ => Err(ParsePrivacyError(s.to_string())),
        }
    }
}

/// Metadata sent along with an upload.
///
/// Derived deterministically from the staged file; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub title: String,
    pub description: String,
    pub category: String,
    pub privacy: Privacy,
}

impl UploadRecord {
    /// YouTube "People & Blogs".
    pub const DEFAULT_CATEGORY: &'static str = "22";

    /// Build the record for a staged file.
    ///
    /// Title is the file stem, description names the full file name.
    /// Returns `None` for paths without a file name.
    pub fn for_staged_file(path: &Path, category: &str, privacy: Privacy) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());

        Some(Self {
            title,
            description: format!("Video uploaded from {}", file_name),
            category: category.to_string(),
            privacy,
        })
    }
}
