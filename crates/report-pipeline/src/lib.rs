//! Tabular Report Generation Library
//!
//! Turns a CSV or Excel upload into a single JSON-safe analytical report,
//! built with Rust and Polars.
//!
//! # Overview
//!
//! One call to [`ReportPipeline::generate`] runs these stages in order:
//!
//! - **Loading**: CSV, XLS and XLSX bytes become a [`polars::prelude::DataFrame`]
//! - **Normalization**: every column is classified as numeric, datetime or
//!   categorical and coerced to match
//! - **Summary**: descriptive statistics plus numeric and trend insights
//! - **Enhancement** (optional): an [`ai::InsightEnhancer`] rewrites the
//!   insights as a narrative
//! - **Anomaly detection**: isolation forest over the numeric columns
//! - **Forecasting**: least-squares trend projected a few days ahead
//! - **Charts**: Plotly-format time-series and correlation figures
//! - **Assembly**: everything is merged and sanitized into a [`ReportValue`]
//!
//! Only loading and sanitizing can fail the run. Every other stage that
//! fails is logged, recorded in [`GeneratedReport::stages`], and leaves its
//! key out of the artifact.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use report_pipeline::ReportPipeline;
//! use report_pipeline::ai::HuggingFaceEnhancer;
//! use std::sync::Arc;
//!
//! let bytes = std::fs::read("sales.csv")?;
//!
//! // Option 1: With a narrative summary
//! let enhancer = Arc::new(HuggingFaceEnhancer::new(token)?);
//! let report = ReportPipeline::builder()
//!     .enhancer(enhancer)
//!     .build()?
//!     .generate(&bytes, ".csv", "1")?;
//!
//! // Option 2: Structured insights only
//! let report = ReportPipeline::builder()
//!     .build()?
//!     .generate(&bytes, ".csv", "1")?;
//!
//! println!("{}", report.to_json()?);
//! ```
//!
//! # Configuration
//!
//! Use [`ReportConfig`] to tune the analysis stages:
//!
//! ```rust,ignore
//! use report_pipeline::ReportConfig;
//!
//! let config = ReportConfig::builder()
//!     .contamination(0.1)          // Flag ~10% of rows
//!     .forecast_horizon_days(7)    // Project a week ahead
//!     .trend_value_column("sales") // Column for the trend chart
//!     .build()?;
//! ```

pub mod ai;
pub mod analysis;
pub mod charts;
pub mod config;
pub mod error;
pub mod loader;
pub mod normalizer;
pub mod pipeline;
pub mod reporting;
pub mod summary;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, ReportConfig, ReportConfigBuilder};
pub use error::{
    ComputationError, IngestionError, ReportError, Result as ReportResult, ResultExt, SanitizeError,
};
pub use loader::{FileFormat, load_table};
pub use normalizer::normalize;
pub use pipeline::{
    GeneratedReport, ReportPipeline, ReportPipelineBuilder, ReportStage, StageOutcome,
    StageRecord, StageStatus,
};
pub use reporting::{ReportValue, sanitize};
pub use summary::{NumericSummary, enhance, summarize};
pub use types::{
    AnomalyRecord, ColumnSchema, ColumnStats, ForecastPoint, Insight, SemanticType, Table,
    TrendDirection,
};
