//! Narrative enhancement trait.
//!
//! An [`InsightEnhancer`] rewrites the plain-text insight summaries into a
//! readable narrative, typically by calling a text-generation service.
//!
//! # Implementing an Enhancer
//!
//! ```rust,ignore
//! use report_pipeline::ai::InsightEnhancer;
//!
//! struct Shouting;
//!
//! impl InsightEnhancer for Shouting {
//!     fn enhance(&self, insights: &str) -> anyhow::Result<String> {
//!         Ok(insights.to_uppercase())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Shouting"
//!     }
//! }
//! ```

use anyhow::Result;

/// A best-effort collaborator that turns insight summaries into prose.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a pipeline holding one can be
/// shared across worker threads.
///
/// # Error Handling
///
/// Any error is treated as "enhancement unavailable": the pipeline logs a
/// warning and the structured insights are reported unchanged.
pub trait InsightEnhancer: Send + Sync {
    /// Rewrite newline-separated insight summaries as a narrative.
    fn enhance(&self, insights: &str) -> Result<String>;

    /// Enhancer name for logging.
    fn name(&self) -> &str;

    /// The model behind this enhancer, if it exposes one.
    fn model(&self) -> Option<&str> {
        None
    }
}
