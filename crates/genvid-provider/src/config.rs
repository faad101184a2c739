//! Provider configuration.

use std::time::Duration;

/// Configuration for the generation provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Backend to use (currently only "cogvideo")
    pub provider: String,
    /// API key for the provider
    pub api_key: String,
    /// Base URL of the provider API
    pub base_url: String,
    /// Model identifier sent with every submit
    pub model: String,
    /// Quality hint ("speed" or "quality")
    pub quality: String,
    /// Interval between status polls
    pub poll_interval: Duration,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "cogvideo".to_string(),
            api_key: String::new(),
            base_url: "https://open.bigmodel.cn/api/paas/v4".to_string(),
            model: "cogvideox-3".to_string(),
            quality: "speed".to_string(),
            poll_interval: Duration::from_secs(10),
            http_timeout: Duration::from_secs(60),
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: std::env::var("GENERATION_PROVIDER").unwrap_or(defaults.provider),
            api_key: std::env::var("GENERATION_API_KEY").unwrap_or_default(),
            base_url: std::env::var("GENERATION_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("GENERATION_MODEL").unwrap_or(defaults.model),
            quality: std::env::var("GENERATION_QUALITY").unwrap_or(defaults.quality),
            poll_interval: Duration::from_secs(
                std::env::var("GENERATION_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            http_timeout: Duration::from_secs(
                std::env::var("GENERATION_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }
}
