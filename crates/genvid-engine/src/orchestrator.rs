//! Project orchestration.
//!
//! `Orchestrator::request_generation` is the synchronous entry point:
//! it validates credits and ownership, takes the debit, moves the
//! project to `queued` and hands the run to the background pool. The
//! pipeline itself (`run_pipeline`) executes detached; its failures are
//! absorbed into the project's `failed` status plus a credit refund and
//! are never re-raised, because no caller is waiting.

use std::sync::Arc;

use tracing::{error, info, warn};

use genvid_db::{CreditStore, ProjectStore, StoreError};
use genvid_media::MergeOutcome;
use genvid_models::{GenerateVideoRequest, Project, ProjectId, ProjectStatus, UserId};
use genvid_provider::{GenerationClient, SubmitRequest};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::image::load_image_as_data_uri;
use crate::ledger::CreditLedger;
use crate::merge::ClipMerger;
use crate::planner::{segment_count, split_script};
use crate::pool::PipelinePool;

/// Instruction prepended to every segment prompt when a product image
/// is attached.
const PRODUCT_FIDELITY_INSTRUCTION: &str = "Strictly preserve the exact appearance of the \
product in the image: maintain identical shape, size, colors, textures, materials, branding, \
logos, labels, and all visual details. Do not modify, distort, or alter the product in any way. \
Only animate the scene around the product.";

/// Everything a pipeline run needs, shared across the pool workers.
pub struct PipelineContext {
    pub projects: Arc<dyn ProjectStore>,
    pub ledger: CreditLedger,
    pub client: Arc<dyn GenerationClient>,
    pub merger: Arc<dyn ClipMerger>,
    pub config: EngineConfig,
}

/// Orchestrates generation requests and their background runs.
pub struct Orchestrator {
    ctx: Arc<PipelineContext>,
    pool: PipelinePool,
}

impl Orchestrator {
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        credits: Arc<dyn CreditStore>,
        client: Arc<dyn GenerationClient>,
        merger: Arc<dyn ClipMerger>,
        config: EngineConfig,
    ) -> Self {
        let ctx = Arc::new(PipelineContext {
            projects,
            ledger: CreditLedger::new(credits),
            client,
            merger,
            config: config.clone(),
        });
        let pool = PipelinePool::start(Arc::clone(&ctx), &config);
        Self { ctx, pool }
    }

    /// Validate, debit one credit, queue the project, and detach a
    /// pipeline run. Returns the `queued` project immediately; the
    /// eventual outcome is observable only by re-reading its status.
    pub async fn request_generation(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
        request: &GenerateVideoRequest,
    ) -> EngineResult<Project> {
        if !self.ctx.ledger.has_credits(user_id).await? {
            return Err(EngineError::InsufficientCredits);
        }

        let mut project = self
            .ctx
            .projects
            .get_project(project_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => EngineError::NotFound,
                other => other.into(),
            })?;

        if project.user_id != *user_id {
            return Err(EngineError::Unauthorized);
        }

        self.ctx.ledger.debit_one(user_id).await?;

        let prior_status = project.status;
        let prior_progress = project.progress_percent;

        // Optimistic guard: only one run may hold the project. The
        // debit is reverted if another run got there first.
        match self.ctx.projects.try_begin_run(project_id).await {
            Ok(true) => {}
            Ok(false) => {
                self.ctx.ledger.credit_one(user_id).await;
                return Err(EngineError::AlreadyRunning);
            }
            Err(e) => {
                self.ctx.ledger.credit_one(user_id).await;
                return Err(e.into());
            }
        }

        let language = request.language_or_default().to_string();
        let duration = request.duration_or_default();

        if let Err(e) = self
            .ctx
            .projects
            .update_inputs(project_id, &request.script, &language, request.format, duration)
            .await
        {
            self.rollback_request(project_id, user_id, prior_status, prior_progress)
                .await;
            return Err(e.into());
        }

        project.script = Some(request.script.clone());
        project.language = language;
        project.format = request.format;
        project.video_duration = duration;
        project.status = ProjectStatus::Queued;
        project.progress_percent = 0;

        if let Err(e) = self.pool.submit(project.clone()).await {
            self.rollback_request(project_id, user_id, prior_status, prior_progress)
                .await;
            return Err(e);
        }

        info!(project_id = %project_id, user_id = %user_id, "Queued generation run");
        Ok(project)
    }

    /// Revert the queued transition and the debit after a synchronous
    /// failure. Best effort: the caller already has an error to surface.
    async fn rollback_request(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
        prior_status: ProjectStatus,
        prior_progress: u8,
    ) {
        if let Err(e) = self
            .ctx
            .projects
            .update_status(project_id, prior_status, prior_progress)
            .await
        {
            warn!(project_id = %project_id, error = %e, "Failed to restore prior project status");
        }
        self.ctx.ledger.credit_one(user_id).await;
    }

    /// Stop accepting new pipeline runs.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

/// One end-to-end pipeline run: plan, generate per segment, poll,
/// merge, persist.
pub(crate) async fn run_pipeline(ctx: &PipelineContext, project: Project) {
    let project_id = project.id.clone();
    info!(project_id = %project_id, "Starting generation pipeline");

    set_progress(ctx, &project_id, 10).await;

    let duration = if project.video_duration == 0 {
        genvid_models::request::DEFAULT_DURATION_SECS
    } else {
        project.video_duration
    };
    let prompt = project.prompt();
    let size = project.format.size().spec();

    // The image is loaded once and attached to every segment; failure
    // to load it is non-fatal.
    let image = match project.product_image_url.as_deref() {
        Some(reference) if !reference.is_empty() => {
            match load_image_as_data_uri(&ctx.config.upload_dir, reference).await {
                Ok(uri) => Some(uri),
                Err(e) => {
                    warn!(
                        project_id = %project_id,
                        error = %e,
                        "Failed to load product image, generating without it"
                    );
                    None
                }
            }
        }
        _ => None,
    };

    let segments = split_script(&prompt, segment_count(duration));
    let total = segments.len();

    let mut clip_urls: Vec<String> = Vec::with_capacity(total);
    let mut thumbnail_url: Option<String> = None;

    for (i, segment) in segments.iter().enumerate() {
        let baseline = (10 + i * 60 / total) as u8;
        set_progress(ctx, &project_id, baseline).await;

        let request = match &image {
            Some(uri) => {
                SubmitRequest::new(format!("{PRODUCT_FIDELITY_INSTRUCTION} {segment}"), &size)
                    .with_image(uri)
            }
            None => SubmitRequest::new(segment.clone(), &size),
        };

        let handle = match ctx.client.submit(&request).await {
            Ok(handle) => handle,
            Err(e) => {
                fail_run(ctx, &project, &format!("Segment {} failed: {e}", i + 1)).await;
                return;
            }
        };

        if i == 0 {
            // Record the remote linkage as soon as the first task is accepted.
            if let Err(e) = ctx
                .projects
                .set_processing(&project_id, &handle.task_id, ctx.client.provider_name())
                .await
            {
                warn!(project_id = %project_id, error = %e, "Failed to record remote task linkage");
            }
        }

        set_progress(ctx, &project_id, baseline + (30 / total) as u8).await;

        let clip = match ctx
            .client
            .await_completion(&handle, ctx.config.segment_timeout)
            .await
        {
            Ok(clip) => clip,
            Err(e) => {
                fail_run(
                    ctx,
                    &project,
                    &format!("Segment {} completion failed: {e}", i + 1),
                )
                .await;
                return;
            }
        };

        if let Some(url) = clip.video_url {
            if i == 0 {
                thumbnail_url = clip.thumbnail_url;
            }
            clip_urls.push(url);
        }
    }

    set_progress(ctx, &project_id, 90).await;

    if clip_urls.is_empty() {
        fail_run(ctx, &project, "No videos generated").await;
        return;
    }

    let final_url = match ctx.merger.merge(&clip_urls, &project_id).await {
        Ok(MergeOutcome::Single(url)) => url,
        Ok(MergeOutcome::Merged(path)) => {
            let file = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{}/{}", ctx.config.media_public_prefix, file)
        }
        Err(e) => {
            // Degrade to the first successful clip instead of failing
            // the whole run.
            warn!(project_id = %project_id, error = %e, "Merge failed, falling back to first clip");
            clip_urls[0].clone()
        }
    };

    if let Err(e) = ctx
        .projects
        .set_completed(
            &project_id,
            &final_url,
            thumbnail_url.as_deref().unwrap_or(""),
        )
        .await
    {
        error!(project_id = %project_id, error = %e, "Failed to persist completion");
        fail_run(ctx, &project, &format!("Failed to persist result: {e}")).await;
        return;
    }

    metrics::counter!("genvid_pipeline_completed_total").increment(1);
    info!(project_id = %project_id, video_url = %final_url, "Generation pipeline completed");
}

/// Terminal failure of a background run: persist `failed` with the
/// message and refund the single debit. Called exactly once per run.
async fn fail_run(ctx: &PipelineContext, project: &Project, message: &str) {
    error!(project_id = %project.id, message, "Generation pipeline failed");
    if let Err(e) = ctx.projects.set_failed(&project.id, message).await {
        error!(project_id = %project.id, error = %e, "Failed to persist failure status");
    }
    ctx.ledger.credit_one(&project.user_id).await;
    metrics::counter!("genvid_pipeline_failed_total").increment(1);
}

async fn set_progress(ctx: &PipelineContext, project_id: &ProjectId, progress: u8) {
    if let Err(e) = ctx
        .projects
        .update_status(project_id, ProjectStatus::Processing, progress)
        .await
    {
        warn!(project_id = %project_id, error = %e, "Failed to update progress");
    }
}
