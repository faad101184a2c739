//! Shared data models for the GenVid backend.
//!
//! This crate provides Serde-serializable types for:
//! - Projects and their generation lifecycle
//! - Video formats and output sizes
//! - User credit balances
//! - Generation request payloads

pub mod credits;
pub mod format;
pub mod ids;
pub mod project;
pub mod request;

// Re-export common types
pub use credits::CreditBalance;
pub use format::{VideoFormat, VideoSize};
pub use ids::{ProjectId, UserId};
pub use project::{Project, ProjectStatus};
pub use request::GenerateVideoRequest;
