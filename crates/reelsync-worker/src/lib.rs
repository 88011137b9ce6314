//! OneDrive to YouTube transfer pipeline.
//!
//! One run walks the drive, stages every video locally, uploads the staged
//! files and clears the staging directory. Every step is mirrored to an
//! append-only action log.

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod staging;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::{Action, ActionLog};
pub use pipeline::{Pipeline, PipelineStage, PipelineSummary};
pub use staging::CleanupOutcome;
