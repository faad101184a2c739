//! Video generation orchestration for the GenVid backend.
//!
//! The engine turns a stored project into a finished video: it plans
//! the script into segments, drives the asynchronous generation
//! provider per segment, merges the resulting clips, and reconciles
//! the user's credit balance against the outcome. Generation runs
//! execute on a bounded in-process pool, detached from the request
//! that started them.

pub mod config;
pub mod error;
pub mod image;
pub mod ledger;
pub mod merge;
pub mod orchestrator;
pub mod planner;
pub mod pool;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use ledger::CreditLedger;
pub use merge::ClipMerger;
pub use orchestrator::{Orchestrator, PipelineContext};
pub use pool::PipelinePool;

#[cfg(test)]
mod orchestrator_tests;
