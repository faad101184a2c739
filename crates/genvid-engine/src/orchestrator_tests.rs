//! Orchestrator and pipeline behavior tests.
//!
//! Stores, the generation client and the merger are mocked; the
//! pipeline itself runs for real.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;

use genvid_db::{CreditStore, ProjectStore, StoreError, StoreResult};
use genvid_media::{MediaError, MediaResult, MergeOutcome};
use genvid_models::{
    CreditBalance, GenerateVideoRequest, Project, ProjectId, ProjectStatus, UserId, VideoFormat,
};
use genvid_provider::{
    GeneratedClip, GenerationClient, PollOutcome, ProviderError, ProviderResult, SubmitRequest,
    TaskHandle,
};

use crate::config::EngineConfig;
use crate::ledger::CreditLedger;
use crate::merge::ClipMerger;
use crate::orchestrator::{run_pipeline, Orchestrator, PipelineContext};

mock! {
    Projects {}

    #[async_trait]
    impl ProjectStore for Projects {
        async fn get_project(&self, id: &ProjectId) -> StoreResult<Project>;
        async fn update_inputs(
            &self,
            id: &ProjectId,
            script: &str,
            language: &str,
            format: VideoFormat,
            duration_secs: u32,
        ) -> StoreResult<()>;
        async fn try_begin_run(&self, id: &ProjectId) -> StoreResult<bool>;
        async fn update_status(
            &self,
            id: &ProjectId,
            status: ProjectStatus,
            progress: u8,
        ) -> StoreResult<()>;
        async fn set_processing(
            &self,
            id: &ProjectId,
            task_id: &str,
            provider: &str,
        ) -> StoreResult<()>;
        async fn set_completed(
            &self,
            id: &ProjectId,
            video_url: &str,
            thumbnail_url: &str,
        ) -> StoreResult<()>;
        async fn set_failed(&self, id: &ProjectId, message: &str) -> StoreResult<()>;
    }
}

mock! {
    Credits {}

    #[async_trait]
    impl CreditStore for Credits {
        async fn get_balance(&self, user_id: &UserId) -> StoreResult<CreditBalance>;
        async fn debit_credit(&self, user_id: &UserId) -> StoreResult<()>;
        async fn credit_credit(&self, user_id: &UserId, amount: u32) -> StoreResult<()>;
    }
}

mock! {
    Client {}

    #[async_trait]
    impl GenerationClient for Client {
        fn provider_name(&self) -> &str;
        fn poll_interval(&self) -> Duration;
        async fn submit(&self, request: &SubmitRequest) -> ProviderResult<TaskHandle>;
        async fn poll(&self, handle: &TaskHandle) -> ProviderResult<PollOutcome>;
        async fn await_completion(
            &self,
            handle: &TaskHandle,
            timeout: Duration,
        ) -> ProviderResult<GeneratedClip>;
    }
}

mock! {
    Merger {}

    #[async_trait]
    impl ClipMerger for Merger {
        async fn merge(
            &self,
            clip_urls: &[String],
            project_id: &ProjectId,
        ) -> MediaResult<MergeOutcome>;
    }
}

fn balance(user_id: &UserId, remaining: u32) -> CreditBalance {
    CreditBalance {
        user_id: user_id.clone(),
        credits_remaining: remaining,
        credits_used_total: 0,
        subscription_tier: "free".to_string(),
    }
}

fn draft_project(user_id: &UserId) -> Project {
    Project::new(user_id.clone())
}

fn request(duration: u32) -> GenerateVideoRequest {
    GenerateVideoRequest {
        script: "First sentence here. Second sentence here. Third sentence here.".to_string(),
        language: "en".to_string(),
        format: VideoFormat::Portrait,
        video_duration: duration,
    }
}

fn handle(task_id: &str) -> TaskHandle {
    TaskHandle {
        task_id: task_id.to_string(),
        provider: "cogvideo".to_string(),
    }
}

fn clip(url: &str, thumbnail: Option<&str>) -> GeneratedClip {
    GeneratedClip {
        video_url: Some(url.to_string()),
        thumbnail_url: thumbnail.map(|t| t.to_string()),
        duration_seconds: Some(5.0),
    }
}

fn context(
    projects: MockProjects,
    credits: MockCredits,
    client: MockClient,
    merger: MockMerger,
) -> PipelineContext {
    PipelineContext {
        projects: Arc::new(projects),
        ledger: CreditLedger::new(Arc::new(credits)),
        client: Arc::new(client),
        merger: Arc::new(merger),
        config: EngineConfig::default(),
    }
}

// =============================================================================
// Synchronous request path
// =============================================================================

#[tokio::test]
async fn zero_credits_rejects_without_touching_the_project() {
    let user_id = UserId::new();
    let project_id = ProjectId::new();

    let mut credits = MockCredits::new();
    let check_user = user_id.clone();
    credits
        .expect_get_balance()
        .returning(move |_| Ok(balance(&check_user, 0)));
    credits.expect_debit_credit().times(0);

    let mut projects = MockProjects::new();
    projects.expect_get_project().times(0);
    projects.expect_try_begin_run().times(0);

    let orchestrator = Orchestrator::new(
        Arc::new(projects),
        Arc::new(credits),
        Arc::new(MockClient::new()),
        Arc::new(MockMerger::new()),
        EngineConfig::default(),
    );

    let err = orchestrator
        .request_generation(&project_id, &user_id, &request(5))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::EngineError::InsufficientCredits));
}

#[tokio::test]
async fn missing_project_is_not_found() {
    let user_id = UserId::new();
    let project_id = ProjectId::new();

    let mut credits = MockCredits::new();
    let check_user = user_id.clone();
    credits
        .expect_get_balance()
        .returning(move |_| Ok(balance(&check_user, 1)));

    let mut projects = MockProjects::new();
    projects
        .expect_get_project()
        .returning(|_| Err(StoreError::NotFound));

    let orchestrator = Orchestrator::new(
        Arc::new(projects),
        Arc::new(credits),
        Arc::new(MockClient::new()),
        Arc::new(MockMerger::new()),
        EngineConfig::default(),
    );

    let err = orchestrator
        .request_generation(&project_id, &user_id, &request(5))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::EngineError::NotFound));
}

#[tokio::test]
async fn foreign_project_is_unauthorized() {
    let user_id = UserId::new();
    let other_user = UserId::new();
    let project_id = ProjectId::new();

    let mut credits = MockCredits::new();
    let check_user = user_id.clone();
    credits
        .expect_get_balance()
        .returning(move |_| Ok(balance(&check_user, 1)));
    credits.expect_debit_credit().times(0);

    let mut projects = MockProjects::new();
    projects
        .expect_get_project()
        .returning(move |_| Ok(draft_project(&other_user)));

    let orchestrator = Orchestrator::new(
        Arc::new(projects),
        Arc::new(credits),
        Arc::new(MockClient::new()),
        Arc::new(MockMerger::new()),
        EngineConfig::default(),
    );

    let err = orchestrator
        .request_generation(&project_id, &user_id, &request(5))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::EngineError::Unauthorized));
}

#[tokio::test]
async fn concurrent_run_is_rejected_and_debit_reverted() {
    let user_id = UserId::new();
    let project_id = ProjectId::new();

    let mut credits = MockCredits::new();
    let check_user = user_id.clone();
    credits
        .expect_get_balance()
        .returning(move |_| Ok(balance(&check_user, 1)));
    credits.expect_debit_credit().times(1).returning(|_| Ok(()));
    credits
        .expect_credit_credit()
        .times(1)
        .returning(|_, _| Ok(()));

    let mut projects = MockProjects::new();
    let owner = user_id.clone();
    projects
        .expect_get_project()
        .returning(move |_| Ok(draft_project(&owner)));
    projects
        .expect_try_begin_run()
        .times(1)
        .returning(|_| Ok(false));
    projects.expect_update_inputs().times(0);

    let orchestrator = Orchestrator::new(
        Arc::new(projects),
        Arc::new(credits),
        Arc::new(MockClient::new()),
        Arc::new(MockMerger::new()),
        EngineConfig::default(),
    );

    let err = orchestrator
        .request_generation(&project_id, &user_id, &request(5))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::EngineError::AlreadyRunning));
}

// =============================================================================
// End-to-end through the pool
// =============================================================================

#[tokio::test]
async fn single_segment_run_completes_without_refund() {
    let user_id = UserId::new();

    let mut credits = MockCredits::new();
    let check_user = user_id.clone();
    credits
        .expect_get_balance()
        .returning(move |_| Ok(balance(&check_user, 1)));
    credits.expect_debit_credit().times(1).returning(|_| Ok(()));
    credits.expect_credit_credit().times(0);

    let progress = Arc::new(Mutex::new(Vec::<u8>::new()));
    let progress_log = Arc::clone(&progress);

    let mut projects = MockProjects::new();
    let owner = user_id.clone();
    projects
        .expect_get_project()
        .returning(move |_| Ok(draft_project(&owner)));
    projects.expect_try_begin_run().returning(|_| Ok(true));
    projects
        .expect_update_inputs()
        .times(1)
        .returning(|_, _, _, _, _| Ok(()));
    projects.expect_update_status().returning(move |_, _, p| {
        progress_log.lock().unwrap().push(p);
        Ok(())
    });
    projects
        .expect_set_processing()
        .times(1)
        .withf(|_, task_id, provider| task_id == "task-1" && provider == "cogvideo")
        .returning(|_, _, _| Ok(()));

    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();
    projects
        .expect_set_completed()
        .times(1)
        .withf(|_, video_url, _| !video_url.is_empty())
        .returning(move |_, video_url, _| {
            done_tx.send(video_url.to_string()).unwrap();
            Ok(())
        });
    projects.expect_set_failed().times(0);

    let mut client = MockClient::new();
    client.expect_provider_name().return_const("cogvideo".to_string());
    client
        .expect_submit()
        .times(1)
        .withf(|request| request.size == "1080x1920")
        .returning(|_| Ok(handle("task-1")));
    client
        .expect_await_completion()
        .times(1)
        .returning(|_, _| Ok(clip("https://cdn.example/clip-1.mp4", Some("https://cdn.example/t1.jpg"))));

    let mut merger = MockMerger::new();
    merger
        .expect_merge()
        .times(1)
        .returning(|urls, _| Ok(MergeOutcome::Single(urls[0].clone())));

    let orchestrator = Orchestrator::new(
        Arc::new(projects),
        Arc::new(credits),
        Arc::new(client),
        Arc::new(merger),
        EngineConfig::default(),
    );

    let project = orchestrator
        .request_generation(&ProjectId::new(), &user_id, &request(5))
        .await
        .unwrap();
    assert_eq!(project.status, ProjectStatus::Queued);
    assert_eq!(project.progress_percent, 0);

    let video_url = tokio::time::timeout(Duration::from_secs(2), done_rx.recv())
        .await
        .expect("pipeline did not finish")
        .unwrap();
    assert_eq!(video_url, "https://cdn.example/clip-1.mp4");

    // Progress only ever moves forward and stays below the final 100
    // that set_completed writes.
    let observed = progress.lock().unwrap().clone();
    assert!(!observed.is_empty());
    assert!(observed.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*observed.last().unwrap(), 90);
}

// =============================================================================
// Pipeline failure semantics
// =============================================================================

#[tokio::test]
async fn submit_failure_fails_run_and_refunds_once() {
    let user_id = UserId::new();
    let mut project = draft_project(&user_id);
    project.script = Some("A script that will not make it.".to_string());
    project.video_duration = 5;

    let mut projects = MockProjects::new();
    projects.expect_update_status().returning(|_, _, _| Ok(()));
    projects
        .expect_set_failed()
        .times(1)
        .withf(|_, message| message.starts_with("Segment 1 failed:"))
        .returning(|_, _| Ok(()));
    projects.expect_set_completed().times(0);

    let mut credits = MockCredits::new();
    credits
        .expect_credit_credit()
        .times(1)
        .withf(|_, amount| *amount == 1)
        .returning(|_, _| Ok(()));

    let mut client = MockClient::new();
    client.expect_provider_name().return_const("cogvideo".to_string());
    client.expect_submit().times(1).returning(|_| {
        Err(ProviderError::RemoteRejected {
            code: "1301".to_string(),
            message: "rejected".to_string(),
        })
    });

    let ctx = context(projects, credits, client, MockMerger::new());
    run_pipeline(&ctx, project).await;
}

#[tokio::test]
async fn mid_run_failure_names_the_segment_and_refunds_once() {
    let user_id = UserId::new();
    let mut project = draft_project(&user_id);
    project.script =
        Some("First sentence here. Second sentence here. Third sentence here.".to_string());
    project.video_duration = 25; // 3 segments

    let mut projects = MockProjects::new();
    projects.expect_update_status().returning(|_, _, _| Ok(()));
    projects.expect_set_processing().returning(|_, _, _| Ok(()));
    projects
        .expect_set_failed()
        .times(1)
        .withf(|_, message| message.starts_with("Segment 2 completion failed:"))
        .returning(|_, _| Ok(()));
    projects.expect_set_completed().times(0);

    let mut credits = MockCredits::new();
    credits
        .expect_credit_credit()
        .times(1)
        .returning(|_, _| Ok(()));

    let calls = AtomicUsize::new(0);
    let mut client = MockClient::new();
    client.expect_provider_name().return_const("cogvideo".to_string());
    client.expect_submit().times(2).returning(|_| Ok(handle("t")));
    client.expect_await_completion().times(2).returning(move |_, _| {
        match calls.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(clip("https://cdn.example/clip-1.mp4", None)),
            _ => Err(ProviderError::GenerationTimeout(Duration::from_secs(600))),
        }
    });

    let ctx = context(projects, credits, client, MockMerger::new());
    run_pipeline(&ctx, project).await;
}

#[tokio::test]
async fn no_clips_produced_fails_the_run() {
    let user_id = UserId::new();
    let mut project = draft_project(&user_id);
    project.script = Some("A script whose clip never materializes.".to_string());
    project.video_duration = 5;

    let mut projects = MockProjects::new();
    projects.expect_update_status().returning(|_, _, _| Ok(()));
    projects.expect_set_processing().returning(|_, _, _| Ok(()));
    projects
        .expect_set_failed()
        .times(1)
        .withf(|_, message| message == "No videos generated")
        .returning(|_, _| Ok(()));
    projects.expect_set_completed().times(0);

    let mut credits = MockCredits::new();
    credits
        .expect_credit_credit()
        .times(1)
        .returning(|_, _| Ok(()));

    let mut client = MockClient::new();
    client.expect_provider_name().return_const("cogvideo".to_string());
    client.expect_submit().returning(|_| Ok(handle("t")));
    client
        .expect_await_completion()
        .returning(|_, _| Ok(GeneratedClip::default()));

    let ctx = context(projects, credits, client, MockMerger::new());
    run_pipeline(&ctx, project).await;
}

#[tokio::test]
async fn merge_failure_falls_back_to_first_clip() {
    let user_id = UserId::new();
    let mut project = draft_project(&user_id);
    project.script =
        Some("First sentence here. Second sentence here. Third sentence here.".to_string());
    project.video_duration = 25; // 3 segments

    let mut projects = MockProjects::new();
    projects.expect_update_status().returning(|_, _, _| Ok(()));
    projects.expect_set_processing().returning(|_, _, _| Ok(()));
    projects
        .expect_set_completed()
        .times(1)
        .withf(|_, video_url, thumbnail_url| {
            video_url == "https://cdn.example/clip-1.mp4"
                && thumbnail_url == "https://cdn.example/t1.jpg"
        })
        .returning(|_, _, _| Ok(()));
    projects.expect_set_failed().times(0);

    let mut credits = MockCredits::new();
    credits.expect_credit_credit().times(0);

    let calls = AtomicUsize::new(0);
    let mut client = MockClient::new();
    client.expect_provider_name().return_const("cogvideo".to_string());
    client.expect_submit().times(3).returning(|_| Ok(handle("t")));
    client.expect_await_completion().times(3).returning(move |_, _| {
        let i = calls.fetch_add(1, Ordering::SeqCst) + 1;
        let thumbnail = (i == 1).then_some("https://cdn.example/t1.jpg");
        Ok(clip(&format!("https://cdn.example/clip-{i}.mp4"), thumbnail))
    });

    let mut merger = MockMerger::new();
    merger
        .expect_merge()
        .times(1)
        .withf(|urls, _| urls.len() == 3)
        .returning(|_, _| Err(MediaError::merge_failed("ffmpeg exploded")));

    let ctx = context(projects, credits, client, merger);
    run_pipeline(&ctx, project).await;
}

#[tokio::test]
async fn merged_output_is_mapped_to_public_url() {
    let user_id = UserId::new();
    let mut project = draft_project(&user_id);
    let project_id = project.id.clone();
    project.script = Some("One here. Two here. Three here.".to_string());
    project.video_duration = 25;

    let mut projects = MockProjects::new();
    projects.expect_update_status().returning(|_, _, _| Ok(()));
    projects.expect_set_processing().returning(|_, _, _| Ok(()));
    projects
        .expect_set_completed()
        .times(1)
        .withf(move |_, video_url, _| {
            *video_url == format!("/media/{project_id}_merged.mp4")
        })
        .returning(|_, _, _| Ok(()));

    let mut credits = MockCredits::new();
    credits.expect_credit_credit().times(0);

    let calls = AtomicUsize::new(0);
    let mut client = MockClient::new();
    client.expect_provider_name().return_const("cogvideo".to_string());
    client.expect_submit().returning(|_| Ok(handle("t")));
    client.expect_await_completion().returning(move |_, _| {
        let i = calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(clip(&format!("https://cdn.example/clip-{i}.mp4"), None))
    });

    let mut merger = MockMerger::new();
    merger.expect_merge().times(1).returning(|_, project_id| {
        Ok(MergeOutcome::Merged(PathBuf::from(format!(
            "media/{project_id}_merged.mp4"
        ))))
    });

    let ctx = context(projects, credits, client, merger);
    run_pipeline(&ctx, project).await;
}

#[tokio::test]
async fn completion_persistence_failure_fails_and_refunds() {
    let user_id = UserId::new();
    let mut project = draft_project(&user_id);
    project.script = Some("A script that generates fine.".to_string());
    project.video_duration = 5;

    let mut projects = MockProjects::new();
    projects.expect_update_status().returning(|_, _, _| Ok(()));
    projects.expect_set_processing().returning(|_, _, _| Ok(()));
    projects
        .expect_set_completed()
        .times(1)
        .returning(|_, _, _| Err(StoreError::decode("row vanished")));
    projects
        .expect_set_failed()
        .times(1)
        .withf(|_, message| message.starts_with("Failed to persist result:"))
        .returning(|_, _| Ok(()));

    let mut credits = MockCredits::new();
    credits
        .expect_credit_credit()
        .times(1)
        .returning(|_, _| Ok(()));

    let mut client = MockClient::new();
    client.expect_provider_name().return_const("cogvideo".to_string());
    client.expect_submit().returning(|_| Ok(handle("t")));
    client
        .expect_await_completion()
        .returning(|_, _| Ok(clip("https://cdn.example/clip-1.mp4", None)));

    let mut merger = MockMerger::new();
    merger
        .expect_merge()
        .returning(|urls, _| Ok(MergeOutcome::Single(urls[0].clone())));

    let ctx = context(projects, credits, client, merger);
    run_pipeline(&ctx, project).await;
}

// =============================================================================
// Image attachment
// =============================================================================

#[tokio::test]
async fn attached_image_reaches_every_segment_with_fidelity_prompt() {
    let user_id = UserId::new();
    let mut project = draft_project(&user_id);
    project.script = Some("Show the product. Show it again.".to_string());
    project.video_duration = 20; // 2 segments
    project.product_image_url = Some("data:image/png;base64,AAAA".to_string());

    let mut projects = MockProjects::new();
    projects.expect_update_status().returning(|_, _, _| Ok(()));
    projects.expect_set_processing().returning(|_, _, _| Ok(()));
    projects
        .expect_set_completed()
        .times(1)
        .returning(|_, _, _| Ok(()));

    let mut credits = MockCredits::new();
    credits.expect_credit_credit().times(0);

    let mut client = MockClient::new();
    client.expect_provider_name().return_const("cogvideo".to_string());
    client
        .expect_submit()
        .times(2)
        .withf(|request| {
            request.image_url.as_deref() == Some("data:image/png;base64,AAAA")
                && request.prompt.starts_with("Strictly preserve the exact appearance")
        })
        .returning(|_| Ok(handle("t")));
    client
        .expect_await_completion()
        .returning(|_, _| Ok(clip("https://cdn.example/clip.mp4", None)));

    let mut merger = MockMerger::new();
    merger
        .expect_merge()
        .returning(|urls, _| Ok(MergeOutcome::Single(urls[0].clone())));

    let ctx = context(projects, credits, client, merger);
    run_pipeline(&ctx, project).await;
}
