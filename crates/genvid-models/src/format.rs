//! Video output formats and their generation sizes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target aspect ratio for a generated video.
///
/// The set of formats is closed: every variant has a fixed output size,
/// so an unmapped format cannot exist at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum VideoFormat {
    /// Vertical short-form video (stories, reels)
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    /// Square video (feed posts)
    #[serde(rename = "1:1")]
    Square,
    /// Horizontal video
    #[serde(rename = "16:9")]
    Landscape,
}

impl VideoFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoFormat::Portrait => "9:16",
            VideoFormat::Square => "1:1",
            VideoFormat::Landscape => "16:9",
        }
    }

    /// Output resolution requested from the generation provider.
    pub fn size(&self) -> VideoSize {
        match self {
            VideoFormat::Portrait => VideoSize::new(1080, 1920),
            VideoFormat::Square => VideoSize::new(1024, 1024),
            VideoFormat::Landscape => VideoSize::new(1920, 1080),
        }
    }

    /// Parse a format tag. Unknown tags fall back to portrait, which
    /// carries the default 1080x1920 generation size.
    pub fn parse_or_default(tag: &str) -> Self {
        match tag {
            "1:1" => VideoFormat::Square,
            "16:9" => VideoFormat::Landscape,
            _ => VideoFormat::Portrait,
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pixel dimensions sent to the generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl VideoSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Wire form expected by the provider API, e.g. `1080x1920`.
    pub fn spec(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl fmt::Display for VideoSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
