//! Capability interface over remote generation backends.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::types::{GeneratedClip, PollOutcome, SubmitRequest, TaskHandle};

/// Asynchronous generation backend: submit a task, then poll it to
/// completion.
///
/// `await_completion` is a provided method so every backend shares the
/// same bounded poll loop; backends only choose the poll interval.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Stable name of the backend, recorded on the project.
    fn provider_name(&self) -> &str;

    /// Interval between status polls.
    fn poll_interval(&self) -> Duration {
        Duration::from_secs(10)
    }

    /// Submit a generation request, returning a handle to the remote task.
    async fn submit(&self, request: &SubmitRequest) -> ProviderResult<TaskHandle>;

    /// Query the current state of a remote task.
    async fn poll(&self, handle: &TaskHandle) -> ProviderResult<PollOutcome>;

    /// Poll on a fixed interval until the task reaches a terminal state
    /// or `timeout` elapses.
    async fn await_completion(
        &self,
        handle: &TaskHandle,
        timeout: Duration,
    ) -> ProviderResult<GeneratedClip> {
        let started = tokio::time::Instant::now();
        loop {
            tokio::time::sleep(self.poll_interval()).await;

            match self.poll(handle).await? {
                PollOutcome::Succeeded(clip) => return Ok(clip),
                PollOutcome::Failed { detail } => {
                    return Err(ProviderError::GenerationFailed(detail));
                }
                PollOutcome::Pending => {
                    debug!(task_id = %handle.task_id, "Generation still pending");
                }
            }

            if started.elapsed() > timeout {
                return Err(ProviderError::GenerationTimeout(timeout));
            }
        }
    }
}
