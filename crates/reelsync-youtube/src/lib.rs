//! YouTube Data API v3 uploads.
//!
//! Videos are sent with the resumable protocol: a metadata POST opens an
//! upload session and the file body is PUT to the returned session URI.

pub mod client;
pub mod error;
pub mod types;

pub use client::{YoutubeClient, YoutubeConfig};
pub use error::{YoutubeError, YoutubeResult};
pub use types::{VideoId, VideoResource, VideoSnippet, VideoStatus};
