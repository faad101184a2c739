//! Wire-independent generation types.

use serde::{Deserialize, Serialize};

/// A single generation request for one segment of a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Prompt text for this segment
    pub prompt: String,
    /// Inline image (data URI) to anchor the generation, if any
    pub image_url: Option<String>,
    /// Output resolution spec, e.g. `1080x1920`
    pub size: String,
}

impl SubmitRequest {
    pub fn new(prompt: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image_url: None,
            size: size.into(),
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Handle to an accepted remote generation task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Task ID at the provider
    pub task_id: String,
    /// Provider that owns the task
    pub provider: String,
}

/// Result payload of a finished generation.
///
/// The provider may report success without a clip URL; callers decide
/// whether that is acceptable for their pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedClip {
    /// URL of the generated clip
    pub video_url: Option<String>,
    /// URL of the cover/thumbnail image
    pub thumbnail_url: Option<String>,
    /// Reported clip duration in seconds
    pub duration_seconds: Option<f64>,
}

/// Outcome of a single poll round trip.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Task still running
    Pending,
    /// Task finished successfully
    Succeeded(GeneratedClip),
    /// Task reached a terminal failure state
    Failed { detail: String },
}
