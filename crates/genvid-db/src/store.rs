//! Narrow store operations consumed by the orchestration core.
//!
//! Each call is independent; there is no shared transaction context.
//! The only operation with an atomicity guarantee is `debit_credit`,
//! which is a single conditional update.

use async_trait::async_trait;

use genvid_models::{CreditBalance, Project, ProjectId, ProjectStatus, UserId, VideoFormat};

use crate::error::StoreResult;

/// Project reads and lifecycle updates.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Load a project by id. `StoreError::NotFound` if absent.
    async fn get_project(&self, id: &ProjectId) -> StoreResult<Project>;

    /// Persist the generation inputs onto the project.
    async fn update_inputs(
        &self,
        id: &ProjectId,
        script: &str,
        language: &str,
        format: VideoFormat,
        duration_secs: u32,
    ) -> StoreResult<()>;

    /// Conditionally transition the project to `queued` (progress 0).
    ///
    /// Returns `false` when the project is already `queued` or
    /// `processing`, i.e. another run holds it. This is the guard that
    /// keeps two concurrent generation requests from racing on one
    /// project.
    async fn try_begin_run(&self, id: &ProjectId) -> StoreResult<bool>;

    /// Write a status/progress pair.
    async fn update_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
        progress: u8,
    ) -> StoreResult<()>;

    /// Record the remote task linkage and mark the run started.
    async fn set_processing(
        &self,
        id: &ProjectId,
        task_id: &str,
        provider: &str,
    ) -> StoreResult<()>;

    /// Terminal success: outputs, progress 100, completion timestamp.
    async fn set_completed(
        &self,
        id: &ProjectId,
        video_url: &str,
        thumbnail_url: &str,
    ) -> StoreResult<()>;

    /// Terminal failure with a human-readable message.
    async fn set_failed(&self, id: &ProjectId, message: &str) -> StoreResult<()>;
}

/// Credit balance reads and the debit/refund pair.
#[async_trait]
pub trait CreditStore: Send + Sync {
    /// Load a user's credit balance. `StoreError::NotFound` if absent.
    async fn get_balance(&self, user_id: &UserId) -> StoreResult<CreditBalance>;

    /// Atomically take one credit: decrements remaining and increments
    /// lifetime-used in a single conditional update, failing with
    /// `StoreError::NoCreditsRemaining` when the balance is zero.
    async fn debit_credit(&self, user_id: &UserId) -> StoreResult<()>;

    /// Unconditionally return credits to the balance (refund).
    async fn credit_credit(&self, user_id: &UserId, amount: u32) -> StoreResult<()>;
}
