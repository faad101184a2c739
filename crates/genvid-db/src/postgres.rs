//! Postgres implementation of the store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::Row;
use tracing::debug;

use genvid_models::{
    CreditBalance, Project, ProjectId, ProjectStatus, UserId, VideoFormat,
};

use crate::error::{StoreError, StoreResult};
use crate::store::{CreditStore, ProjectStore};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Postgres-backed project and credit store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn status_from_str(s: &str) -> StoreResult<ProjectStatus> {
    match s {
        "draft" => Ok(ProjectStatus::Draft),
        "queued" => Ok(ProjectStatus::Queued),
        "processing" => Ok(ProjectStatus::Processing),
        "completed" => Ok(ProjectStatus::Completed),
        "failed" => Ok(ProjectStatus::Failed),
        "canceled" => Ok(ProjectStatus::Canceled),
        other => Err(StoreError::decode(format!("unknown project status: {other}"))),
    }
}

fn project_from_row(row: &sqlx::postgres::PgRow) -> StoreResult<Project> {
    let status: String = row.try_get("status")?;
    let format: String = row.try_get("format")?;
    let progress: i32 = row.try_get("progress_percent")?;
    let duration: i32 = row.try_get("video_duration")?;

    Ok(Project {
        id: ProjectId::from(row.try_get::<String, _>("id")?),
        user_id: UserId::from(row.try_get::<String, _>("user_id")?),
        product_name: row.try_get("product_name")?,
        product_description: row.try_get("product_description")?,
        product_image_url: row.try_get("product_image_url")?,
        script: row.try_get("script")?,
        language: row.try_get("language")?,
        format: VideoFormat::parse_or_default(&format),
        video_duration: duration.max(0) as u32,
        status: status_from_str(&status)?,
        progress_percent: progress.clamp(0, 100) as u8,
        error_message: row.try_get("error_message")?,
        external_task_id: row.try_get("external_task_id")?,
        external_provider: row.try_get("external_provider")?,
        video_url: row.try_get("video_url")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn get_project(&self, id: &ProjectId) -> StoreResult<Project> {
        let row = sqlx::query(
            "SELECT id, user_id, product_name, product_description, product_image_url, \
             script, language, format, video_duration, status, progress_percent, \
             error_message, external_task_id, external_provider, video_url, thumbnail_url, \
             created_at, updated_at, started_at, completed_at \
             FROM projects WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        project_from_row(&row)
    }

    async fn update_inputs(
        &self,
        id: &ProjectId,
        script: &str,
        language: &str,
        format: VideoFormat,
        duration_secs: u32,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE projects SET script = $2, language = $3, format = $4, \
             video_duration = $5, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(script)
        .bind(language)
        .bind(format.as_str())
        .bind(duration_secs as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn try_begin_run(&self, id: &ProjectId) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE projects SET status = 'queued', progress_percent = 0, updated_at = NOW() \
             WHERE id = $1 AND status NOT IN ('queued', 'processing')",
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        let begun = result.rows_affected() > 0;
        debug!(project_id = %id, begun, "Attempted run transition to queued");
        Ok(begun)
    }

    async fn update_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
        progress: u8,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE projects SET status = $2, progress_percent = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(status.as_str())
        .bind(progress as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_processing(
        &self,
        id: &ProjectId,
        task_id: &str,
        provider: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE projects SET status = 'processing', external_task_id = $2, \
             external_provider = $3, started_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(task_id)
        .bind(provider)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_completed(
        &self,
        id: &ProjectId,
        video_url: &str,
        thumbnail_url: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE projects SET status = 'completed', video_url = $2, thumbnail_url = $3, \
             progress_percent = 100, completed_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(video_url)
        .bind(thumbnail_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_failed(&self, id: &ProjectId, message: &str) -> StoreResult<()> {
        sqlx::query(
            "UPDATE projects SET status = 'failed', error_message = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CreditStore for PgStore {
    async fn get_balance(&self, user_id: &UserId) -> StoreResult<CreditBalance> {
        let row = sqlx::query(
            "SELECT credits_remaining, credits_used_total, subscription_tier \
             FROM profiles WHERE id = $1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        let remaining: i32 = row.try_get("credits_remaining")?;
        let used: i32 = row.try_get("credits_used_total")?;

        Ok(CreditBalance {
            user_id: user_id.clone(),
            credits_remaining: remaining.max(0) as u32,
            credits_used_total: used.max(0) as u32,
            subscription_tier: row.try_get("subscription_tier")?,
        })
    }

    async fn debit_credit(&self, user_id: &UserId) -> StoreResult<()> {
        // Single conditional update: no read-then-write window, and the
        // balance can never go below zero.
        let result = sqlx::query(
            "UPDATE profiles SET credits_remaining = credits_remaining - 1, \
             credits_used_total = credits_used_total + 1 \
             WHERE id = $1 AND credits_remaining > 0",
        )
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NoCreditsRemaining);
        }
        Ok(())
    }

    async fn credit_credit(&self, user_id: &UserId, amount: u32) -> StoreResult<()> {
        sqlx::query("UPDATE profiles SET credits_remaining = credits_remaining + $2 WHERE id = $1")
            .bind(user_id.as_str())
            .bind(amount as i32)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_wire_strings() {
        for status in [
            ProjectStatus::Draft,
            ProjectStatus::Queued,
            ProjectStatus::Processing,
            ProjectStatus::Completed,
            ProjectStatus::Failed,
            ProjectStatus::Canceled,
        ] {
            assert_eq!(status_from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_a_decode_error() {
        assert!(matches!(
            status_from_str("archived"),
            Err(StoreError::Decode(_))
        ));
    }
}
