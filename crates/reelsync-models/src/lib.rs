//! Shared data models for the ReelSync pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Remote drive entries (files and folders)
//! - Persisted OAuth credentials
//! - Video classification and upload metadata

pub mod credential;
pub mod entry;
pub mod video;

// Re-export common types
pub use credential::{CredentialRecord, Service};
pub use entry::{EntryKind, ItemId, RemoteEntry};
pub use video::{is_video_file, ParsePrivacyError, Privacy, UploadRecord, VIDEO_EXTENSIONS};
