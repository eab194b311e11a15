//! Optional narrative enhancement of insights.
//!
//! # Feature Flag
//!
//! The [`InsightEnhancer`] trait is always available for custom
//! implementations. The Hugging Face client requires the `ai` feature:
//!
//! ```toml
//! # Enable the Hugging Face enhancer (default)
//! report-pipeline = { version = "0.1", features = ["ai"] }
//!
//! # Structured insights only
//! report-pipeline = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use report_pipeline::ai::HuggingFaceEnhancer;
//! use report_pipeline::ReportPipeline;
//! use std::sync::Arc;
//!
//! let enhancer = Arc::new(HuggingFaceEnhancer::new("hf_...")?);
//! let report = ReportPipeline::builder()
//!     .enhancer(enhancer)
//!     .build()?
//!     .generate(&bytes, ".csv", "1")?;
//! ```

mod enhancer;
pub use enhancer::InsightEnhancer;

#[cfg(feature = "ai")]
mod huggingface;

#[cfg(feature = "ai")]
pub use huggingface::{HuggingFaceConfig, HuggingFaceConfigBuilder, HuggingFaceEnhancer};
