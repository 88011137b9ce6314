//! OneDrive access through the Microsoft Graph REST API.
//!
//! This crate provides:
//! - Folder listing (with `@odata.nextLink` paging)
//! - Redirect-based content download to local disk
//! - A depth-first walker that downloads every video it finds

pub mod client;
pub mod error;
pub mod types;
pub mod walker;

pub use client::{DriveApi, DriveClient, DriveConfig, PARTIAL_SUFFIX};
pub use error::{DriveError, DriveResult};
pub use walker::{TreeWalker, WalkObserver, WalkReport};
