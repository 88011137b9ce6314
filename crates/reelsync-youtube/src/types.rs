//! YouTube API resource types.

use std::fmt;

use serde::{Deserialize, Serialize};

use reelsync_models::UploadRecord;

/// Identifier the hosting service assigns to an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    pub description: String,
    pub category_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    pub privacy_status: String,
}

/// `videos` resource body sent when opening an upload session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResource {
    pub snippet: VideoSnippet,
    pub status: VideoStatus,
}

impl From<&UploadRecord> for VideoResource {
    fn from(record: &UploadRecord) -> Self {
        Self {
            snippet: VideoSnippet {
                title: record.title.clone(),
                description: record.description.clone(),
                category_id: record.category.clone(),
            },
            status: VideoStatus {
                privacy_status: record.privacy.as_str().to_string(),
            },
        }
    }
}

/// Final answer of a completed upload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadedVideo {
    pub id: Option<String>,
}
