//! Pipeline module.
//!
//! This module provides the report pipeline and the per-stage outcome types
//! it records while running.

mod builder;
mod outcome;

pub use builder::{GeneratedReport, ReportPipeline, ReportPipelineBuilder};
pub use outcome::{ReportStage, StageOutcome, StageRecord, StageStatus};
