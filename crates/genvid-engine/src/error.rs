//! Engine error types.

use thiserror::Error;

use genvid_db::StoreError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// User has no credits left and is not on an exempt tier.
    #[error("insufficient credits")]
    InsufficientCredits,

    /// Project does not exist.
    #[error("project not found")]
    NotFound,

    /// Project belongs to a different user.
    #[error("unauthorized")]
    Unauthorized,

    /// A generation run already holds this project.
    #[error("a generation run is already in progress for this project")]
    AlreadyRunning,

    /// The pipeline task channel rejected the job.
    #[error("failed to enqueue pipeline run: {0}")]
    Queue(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("provider error: {0}")]
    Provider(#[from] genvid_provider::ProviderError),

    #[error("media error: {0}")]
    Media(#[from] genvid_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn queue(msg: impl Into<String>) -> Self {
        Self::Queue(msg.into())
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NoCreditsRemaining => Self::InsufficientCredits,
            other => Self::Store(other),
        }
    }
}
