//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while assembling the final video.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    ToolUnavailable,

    #[error("No clips were produced")]
    NoClipsProduced,

    #[error("Clip download failed: {0}")]
    DownloadFailed(String),

    #[error("Merge failed: {0}")]
    MergeFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn merge_failed(msg: impl Into<String>) -> Self {
        Self::MergeFailed(msg.into())
    }
}

impl From<reqwest::Error> for MediaError {
    fn from(err: reqwest::Error) -> Self {
        Self::DownloadFailed(err.to_string())
    }
}
