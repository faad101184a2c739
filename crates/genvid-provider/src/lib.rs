//! Remote video-generation provider clients.
//!
//! Every provider is driven through the same capability interface:
//! submit a generation request, poll the resulting task, and block on
//! completion with a bounded poll loop. The concrete backend is chosen
//! by configuration, not by branching on provider names at call sites.

pub mod client;
pub mod cogvideo;
pub mod config;
pub mod error;
pub mod types;

pub use client::GenerationClient;
pub use cogvideo::CogVideoClient;
pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
pub use types::{GeneratedClip, PollOutcome, SubmitRequest, TaskHandle};

use std::sync::Arc;

/// Build the generation client named by the configuration.
pub fn build_client(config: &ProviderConfig) -> ProviderResult<Arc<dyn GenerationClient>> {
    match config.provider.as_str() {
        cogvideo::PROVIDER_NAME => Ok(Arc::new(CogVideoClient::new(config.clone())?)),
        other => Err(ProviderError::config(format!(
            "unknown generation provider: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_a_config_error() {
        let config = ProviderConfig {
            provider: "heygen".to_string(),
            ..ProviderConfig::default()
        };
        let err = match build_client(&config) {
            Ok(_) => panic!("expected an error for unknown provider"),
            Err(err) => err,
        };
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn cogvideo_provider_builds() {
        let config = ProviderConfig::default();
        assert!(build_client(&config).is_ok());
    }
}
