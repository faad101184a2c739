//! Provider error types.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider accepted the HTTP request but returned an application error code.
    #[error("Generation request rejected: {code} - {message}")]
    RemoteRejected { code: String, message: String },

    /// Transport or HTTP-level failure talking to the provider.
    #[error("Provider request failed: {0}")]
    RemoteError(String),

    /// Remote task reached a terminal failure state.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Remote task did not reach a terminal state before the deadline.
    #[error("Timed out waiting for generation after {0:?}")]
    GenerationTimeout(std::time::Duration),

    /// Provider returned a payload we could not interpret.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteError(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteError(err.to_string())
    }
}
