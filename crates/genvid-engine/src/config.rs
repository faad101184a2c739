//! Engine configuration.

use std::time::Duration;

/// Configuration for the orchestration engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum wall-clock wait for a single segment's generation
    pub segment_timeout: Duration,
    /// Capacity of the in-process pipeline task channel
    pub queue_capacity: usize,
    /// Maximum pipeline runs executing at once
    pub max_concurrent_runs: usize,
    /// Directory uploaded source images are stored under
    pub upload_dir: String,
    /// Directory merged videos are written to
    pub media_dir: String,
    /// Public URL prefix merged videos are served under
    pub media_public_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            segment_timeout: Duration::from_secs(600), // 10 minutes
            queue_capacity: 64,
            max_concurrent_runs: 4,
            upload_dir: "uploads".to_string(),
            media_dir: "media".to_string(),
            media_public_prefix: "/media".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            segment_timeout: Duration::from_secs(
                std::env::var("ENGINE_SEGMENT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            queue_capacity: std::env::var("ENGINE_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64),
            max_concurrent_runs: std::env::var("ENGINE_MAX_CONCURRENT_RUNS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            upload_dir: std::env::var("ENGINE_UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            media_dir: std::env::var("ENGINE_MEDIA_DIR").unwrap_or_else(|_| "media".to_string()),
            media_public_prefix: std::env::var("ENGINE_MEDIA_PUBLIC_PREFIX")
                .unwrap_or_else(|_| "/media".to_string()),
        }
    }
}
