//! Remote drive entries.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::video::is_video_file;

/// Opaque identifier of a drive item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Well-known identifier of the drive root.
    pub const ROOT: &'static str = "root";

    /// The drive root.
    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What a listed entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Folder,
    /// Neither a file nor a folder (packages, remote items). Never traversed.
    Other,
}

/// One child of a folder listing.
///
/// Only exists while a listing is being processed; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub id: ItemId,
    pub name: String,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn file(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn folder(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: EntryKind::Folder,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// True for files whose name carries a recognized video extension.
    pub fn is_video(&self) -> bool {
        self.kind == EntryKind::File && is_video_file(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_id() {
        assert_eq!(ItemId::root().as_str(), "root");
        assert_eq!(ItemId::root().to_string(), "root");
    }

    #[test]
    fn test_video_requires_file_kind() {
        assert!(RemoteEntry::file("1", "clip.MOV").is_video());
        assert!(!RemoteEntry::folder("2", "holiday.mp4").is_video());
        assert!(!RemoteEntry::file("3", "doc.pdf").is_video());
    }

    #[test]
    fn test_entry_kind_serialization() {
        let json = serde_json::to_string(&EntryKind::Folder).unwrap();
        assert_eq!(json, "\"folder\"");
    }
}
