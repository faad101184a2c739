//! Background pipeline pool.
//!
//! Generation runs are detached from the request path: the orchestrator
//! pushes a queued project onto an in-process channel and returns. A
//! dispatcher task pulls jobs off the channel and spawns each run under
//! a semaphore bounding how many pipelines execute at once. The
//! originating request's cancellation has no effect on a run.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Semaphore};
use tracing::info;

use genvid_models::Project;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::orchestrator::{run_pipeline, PipelineContext};

pub struct PipelinePool {
    tx: mpsc::Sender<Project>,
    shutdown: watch::Sender<bool>,
}

impl PipelinePool {
    /// Start the dispatcher and return a handle for submitting runs.
    pub fn start(ctx: Arc<PipelineContext>, config: &EngineConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<Project>(config.queue_capacity);
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_runs));
        let max_concurrent = config.max_concurrent_runs;

        tokio::spawn(async move {
            info!(max_concurrent, "Starting pipeline pool");
            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Shutdown signal received, stopping pipeline pool");
                            break;
                        }
                    }
                    job = rx.recv() => {
                        let Some(project) = job else { break };
                        let permit = match Arc::clone(&semaphore).acquire_owned().await {
                            Ok(permit) => permit,
                            Err(_) => break,
                        };
                        let ctx = Arc::clone(&ctx);
                        tokio::spawn(async move {
                            let _permit = permit;
                            run_pipeline(&ctx, project).await;
                        });
                    }
                }
            }
        });

        Self { tx, shutdown }
    }

    /// Hand a queued project to the background workers. Returns once
    /// the job is on the channel; the run itself is fire-and-forget.
    pub async fn submit(&self, project: Project) -> EngineResult<()> {
        self.tx
            .send(project)
            .await
            .map_err(|_| EngineError::queue("pipeline pool is shut down"))
    }

    /// Stop the dispatcher. In-flight runs finish on their own.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
