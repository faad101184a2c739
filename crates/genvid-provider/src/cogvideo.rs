//! CogVideo generation backend.
//!
//! Talks to the ZhipuAI CogVideoX async API: one POST to open a
//! generation task, then GET polling on the async-result endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::GenerationClient;
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::types::{GeneratedClip, PollOutcome, SubmitRequest, TaskHandle};

pub const PROVIDER_NAME: &str = "cogvideo";

/// Application codes the API uses for an accepted request.
const ACCEPTED_CODES: [&str; 2] = ["200", "100"];

#[derive(Debug, Serialize)]
struct GenerationPayload<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    quality: &'a str,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    task_status: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AsyncResultResponse {
    task_status: String,
    #[serde(default)]
    video_result: Vec<VideoResultPayload>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoResultPayload {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    cover_url: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

/// Client for the CogVideoX API.
pub struct CogVideoClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl CogVideoClient {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self { config, http })
    }

    async fn read_body(response: reqwest::Response) -> ProviderResult<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::remote(format!(
                "API error (status {status}): {body}"
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl GenerationClient for CogVideoClient {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    async fn submit(&self, request: &SubmitRequest) -> ProviderResult<TaskHandle> {
        let payload = GenerationPayload {
            model: &self.config.model,
            prompt: &request.prompt,
            image_url: request.image_url.as_deref(),
            quality: &self.config.quality,
            size: &request.size,
        };

        let response = self
            .http
            .post(format!("{}/videos/generations", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let parsed: GenerationResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("submit response: {e}")))?;

        if let Some(code) = parsed.code.as_deref() {
            if !code.is_empty() && !ACCEPTED_CODES.contains(&code) {
                return Err(ProviderError::RemoteRejected {
                    code: code.to_string(),
                    message: parsed.message.unwrap_or_default(),
                });
            }
        }

        let task_id = parsed
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::invalid_response("submit response missing task id"))?;

        info!(
            task_id = %task_id,
            status = parsed.task_status.as_deref().unwrap_or("unknown"),
            "Submitted generation task"
        );

        Ok(TaskHandle {
            task_id,
            provider: PROVIDER_NAME.to_string(),
        })
    }

    async fn poll(&self, handle: &TaskHandle) -> ProviderResult<PollOutcome> {
        let response = self
            .http
            .get(format!(
                "{}/async-result/{}",
                self.config.base_url, handle.task_id
            ))
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        let parsed: AsyncResultResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("poll response: {e}")))?;

        debug!(task_id = %handle.task_id, status = %parsed.task_status, "Polled generation task");

        match parsed.task_status.as_str() {
            "SUCCESS" => {
                let clip = parsed
                    .video_result
                    .into_iter()
                    .next()
                    .map(|v| GeneratedClip {
                        video_url: v.url.filter(|u| !u.is_empty()),
                        thumbnail_url: v.cover_url.filter(|u| !u.is_empty()),
                        duration_seconds: v.duration,
                    })
                    .unwrap_or_default();
                Ok(PollOutcome::Succeeded(clip))
            }
            "FAILED" | "FAIL" => Ok(PollOutcome::Failed {
                detail: parsed
                    .error
                    .unwrap_or_else(|| "video generation failed".to_string()),
            }),
            _ => Ok(PollOutcome::Pending),
        }
    }
}
