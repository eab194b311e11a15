//! The report artifact.
//!
//! Stage outputs are merged into one [`ReportValue`] tree by [`assemble`],
//! then [`sanitize`] turns every extended value (timestamps, narrow or
//! unsigned integers, float vectors) into a JSON primitive. Only a sanitized
//! tree serializes.
//!
//! # Example
//!
//! ```rust,ignore
//! use report_pipeline::reporting::{sanitize, ReportValue};
//!
//! let tree = ReportValue::object([("count", ReportValue::UInt64(3))]);
//! let clean = sanitize(tree)?;
//! println!("{}", serde_json::to_string_pretty(&clean)?);
//! ```

mod artifact;
mod sanitize;
mod value;

pub use artifact::{ReportParts, assemble};
pub use sanitize::sanitize;
pub use value::{ReportValue, ToReportValue};
