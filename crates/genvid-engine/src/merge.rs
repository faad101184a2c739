//! Merge seam between the pipeline and the media layer.

use async_trait::async_trait;

use genvid_media::{ConcatMerger, MediaResult, MergeOutcome};
use genvid_models::ProjectId;

/// Capability the pipeline needs from the media layer: turn ordered
/// segment clip URLs into one deliverable.
#[async_trait]
pub trait ClipMerger: Send + Sync {
    async fn merge(&self, clip_urls: &[String], project_id: &ProjectId)
        -> MediaResult<MergeOutcome>;
}

#[async_trait]
impl ClipMerger for ConcatMerger {
    async fn merge(
        &self,
        clip_urls: &[String],
        project_id: &ProjectId,
    ) -> MediaResult<MergeOutcome> {
        ConcatMerger::merge(self, clip_urls, project_id.as_str()).await
    }
}
