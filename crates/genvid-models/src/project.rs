//! Project model and generation lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::format::VideoFormat;
use crate::ids::{ProjectId, UserId};

/// Lifecycle status of a project's video generation.
///
/// Transitions are monotonic: `draft -> queued -> processing` and then one
/// of the terminal states. `canceled` is a valid status but is only ever
/// set externally; no pipeline operation produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Queued,
    Processing,
    Completed,
    Failed,
    Canceled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Queued => "queued",
            ProjectStatus::Processing => "processing",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
            ProjectStatus::Canceled => "canceled",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProjectStatus::Completed | ProjectStatus::Failed | ProjectStatus::Canceled
        )
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A video-generation project.
///
/// Invariants maintained by the persistence layer:
/// - `video_url`/`thumbnail_url` are set only when status is `completed`
/// - `error_message` is set only when status is `failed`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    /// Unique project ID
    pub id: ProjectId,

    /// User ID (owner)
    pub user_id: UserId,

    /// Product name shown in the generated video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,

    /// Product description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,

    /// Stored reference or data URI of the product image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_image_url: Option<String>,

    /// Script to generate the video from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    /// ISO 639-1 language code
    #[serde(default)]
    pub language: String,

    /// Target aspect ratio
    #[serde(default)]
    pub format: VideoFormat,

    /// Requested duration in seconds
    #[serde(default)]
    pub video_duration: u32,

    /// Generation lifecycle status
    #[serde(default)]
    pub status: ProjectStatus,

    /// Progress percentage (0-100), non-decreasing while processing
    #[serde(default)]
    pub progress_percent: u8,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Task ID at the remote generation provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_task_id: Option<String>,

    /// Name of the generation provider that ran this project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_provider: Option<String>,

    /// Final video URL (completed only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Thumbnail URL (completed only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// When the pipeline started processing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When the pipeline finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Create a new draft project for a user.
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            user_id,
            product_name: None,
            product_description: None,
            product_image_url: None,
            script: None,
            language: String::new(),
            format: VideoFormat::default(),
            video_duration: 0,
            status: ProjectStatus::Draft,
            progress_percent: 0,
            error_message: None,
            external_task_id: None,
            external_provider: None,
            video_url: None,
            thumbnail_url: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// Full generation prompt: product name line plus script.
    pub fn prompt(&self) -> String {
        let mut prompt = String::new();
        if let Some(name) = &self.product_name {
            prompt.push_str("Product: ");
            prompt.push_str(name);
            prompt.push_str("\n\n");
        }
        if let Some(script) = &self.script {
            prompt.push_str(script);
        }
        prompt
    }
}
