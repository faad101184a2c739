//! Generation request payload.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::format::VideoFormat;

/// Default language when the caller omits one.
pub const DEFAULT_LANGUAGE: &str = "zh";

/// Default requested duration in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 5;

/// Durations the generation provider supports.
pub const ALLOWED_DURATIONS_SECS: [u32; 3] = [5, 10, 30];

/// Parameters for requesting video generation on an existing project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct GenerateVideoRequest {
    /// Script to narrate/animate
    #[validate(length(min = 10, max = 5000))]
    pub script: String,

    /// ISO 639-1 language code; defaults to "zh" when empty
    #[serde(default)]
    #[validate(custom(function = validate_language))]
    pub language: String,

    /// Target aspect ratio
    #[serde(default)]
    pub format: VideoFormat,

    /// Requested duration in seconds; defaults to 5 when zero
    #[serde(default)]
    #[validate(custom(function = validate_duration))]
    pub video_duration: u32,
}

fn validate_language(language: &str) -> Result<(), ValidationError> {
    // Empty means "use the default"; anything else must be ISO 639-1.
    if language.is_empty() || language.chars().count() == 2 {
        Ok(())
    } else {
        Err(ValidationError::new("language"))
    }
}

fn validate_duration(duration: u32) -> Result<(), ValidationError> {
    // Zero means "use the default".
    if duration == 0 || ALLOWED_DURATIONS_SECS.contains(&duration) {
        Ok(())
    } else {
        Err(ValidationError::new("video_duration"))
    }
}

impl GenerateVideoRequest {
    /// Language with the default applied.
    pub fn language_or_default(&self) -> &str {
        if self.language.is_empty() {
            DEFAULT_LANGUAGE
        } else {
            &self.language
        }
    }

    /// Duration with the default applied.
    pub fn duration_or_default(&self) -> u32 {
        if self.video_duration == 0 {
            DEFAULT_DURATION_SECS
        } else {
            self.video_duration
        }
    }
}
