//! Clip concatenation via FFmpeg's concat demuxer.
//!
//! Segment clips are downloaded into a scoped temp directory, listed in
//! a concat manifest, and stream-copied into a single output file. No
//! re-encoding happens here; the segments already share one encoding
//! profile because they come from the same provider.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Verify that ffmpeg is available. Call at startup; merging is not
/// possible without it.
pub fn ensure_ffmpeg() -> MediaResult<()> {
    which::which("ffmpeg").map_err(|_| MediaError::ToolUnavailable)?;
    Ok(())
}

/// Result of a merge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Only one clip existed; its remote URL is returned unchanged.
    Single(String),
    /// Clips were concatenated into this local file.
    Merged(PathBuf),
}

/// Downloads segment clips and concatenates them with FFmpeg.
pub struct ConcatMerger {
    output_dir: PathBuf,
    http: reqwest::Client,
}

impl ConcatMerger {
    /// Create a merger writing final files into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> MediaResult<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            http: reqwest::Client::new(),
        })
    }

    /// Final output path for a project's merged video.
    pub fn output_path(&self, project_id: &str) -> PathBuf {
        self.output_dir.join(format!("{project_id}_merged.mp4"))
    }

    /// Merge the ordered clip URLs into one file.
    ///
    /// Zero clips is an error; a single clip needs no merge and its URL
    /// is passed through. Temp files live in a scoped directory that is
    /// removed on every exit path.
    pub async fn merge(&self, clip_urls: &[String], project_id: &str) -> MediaResult<MergeOutcome> {
        match clip_urls {
            [] => Err(MediaError::NoClipsProduced),
            [only] => Ok(MergeOutcome::Single(only.clone())),
            clips => {
                let output = self.output_path(project_id);
                self.concat(clips, &output).await?;
                Ok(MergeOutcome::Merged(output))
            }
        }
    }

    async fn concat(&self, clip_urls: &[String], output: &Path) -> MediaResult<()> {
        // Dropped on every return below, deleting all partial downloads.
        let workdir = tempfile::tempdir_in(&self.output_dir)?;

        let mut local_files = Vec::with_capacity(clip_urls.len());
        for (i, url) in clip_urls.iter().enumerate() {
            let dest = workdir.path().join(format!("segment_{i}.mp4"));
            self.download_clip(url, &dest)
                .await
                .map_err(|e| MediaError::merge_failed(format!("segment {i}: {e}")))?;
            local_files.push(dest);
        }

        let manifest_path = workdir.path().join("concat_list.txt");
        tokio::fs::write(&manifest_path, concat_manifest(&local_files)).await?;

        debug!(clips = clip_urls.len(), output = %output.display(), "Running FFmpeg concat");

        let result = Command::new("ffmpeg")
            .arg("-f")
            .arg("concat")
            .arg("-safe")
            .arg("0")
            .arg("-i")
            .arg(&manifest_path)
            .arg("-c")
            .arg("copy")
            .arg("-y")
            .arg(output)
            .output()
            .await
            .map_err(|e| MediaError::merge_failed(format!("failed to spawn ffmpeg: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(MediaError::merge_failed(format!(
                "ffmpeg exited with {}: {}",
                result.status, stderr
            )));
        }

        info!(clips = clip_urls.len(), output = %output.display(), "Merged segment clips");
        Ok(())
    }

    async fn download_clip(&self, url: &str, dest: &Path) -> MediaResult<()> {
        let mut response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(MediaError::download_failed(format!(
                "status {} from {}",
                response.status(),
                url
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

/// Build an FFmpeg concat-demuxer manifest listing files in order.
fn concat_manifest(files: &[PathBuf]) -> String {
    let mut manifest = String::new();
    for file in files {
        manifest.push_str(&format!("file '{}'\n", file.display()));
    }
    manifest
}
