//! Clip download and FFmpeg concatenation for the GenVid backend.

pub mod error;
pub mod merger;

pub use error::{MediaError, MediaResult};
pub use merger::{ensure_ffmpeg, ConcatMerger, MergeOutcome};
