//! Graph API response types.

use serde::Deserialize;

use reelsync_models::{EntryKind, ItemId, RemoteEntry};

/// A drive item as returned in a `children` listing.
///
/// Only the facets needed for classification are kept; their contents are
/// irrelevant, presence is what matters.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub file: Option<serde_json::Value>,
    #[serde(default)]
    pub folder: Option<serde_json::Value>,
}

impl From<DriveItem> for RemoteEntry {
    fn from(item: DriveItem) -> Self {
        let kind = if item.file.is_some() {
            EntryKind::File
        } else if item.folder.is_some() {
            EntryKind::Folder
        } else {
            EntryKind::Other
        };

        RemoteEntry {
            id: ItemId::from(item.id),
            name: item.name,
            kind,
        }
    }
}

/// One page of a `children` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveItemPage {
    #[serde(default)]
    pub value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}
