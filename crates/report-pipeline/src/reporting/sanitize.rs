//! Conversion of a report tree into pure JSON primitives.

use super::value::ReportValue;
use crate::error::SanitizeError;
use crate::utils::format_iso;
use std::collections::HashSet;

/// Convert every extended value in `value` into a JSON primitive.
///
/// - narrow and unsigned integers become `Int`
/// - `f32` and float vectors become `Float`, non-finite floats become `Null`
/// - timestamps become ISO-8601 strings
///
/// Arrays and objects keep their shape and key order. Applying the function
/// to its own output returns the same tree.
///
/// # Errors
///
/// A [`SanitizeError`] means a stage produced a value with no JSON
/// representation; callers must treat it as fatal.
pub fn sanitize(value: ReportValue) -> Result<ReportValue, SanitizeError> {
    Ok(match value {
        ReportValue::Null => ReportValue::Null,
        ReportValue::Bool(v) => ReportValue::Bool(v),
        ReportValue::Int(v) => ReportValue::Int(v),
        ReportValue::Float(v) => float(v),
        ReportValue::Str(v) => ReportValue::Str(v),
        ReportValue::Array(items) => ReportValue::Array(
            items
                .into_iter()
                .map(sanitize)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        ReportValue::Object(entries) => {
            let mut seen = HashSet::with_capacity(entries.len());
            let mut out = Vec::with_capacity(entries.len());
            for (key, item) in entries {
                if !seen.insert(key.clone()) {
                    return Err(SanitizeError::DuplicateKey { key });
                }
                out.push((key, sanitize(item)?));
            }
            ReportValue::Object(out)
        }
        ReportValue::Int32(v) => ReportValue::Int(i64::from(v)),
        ReportValue::UInt64(v) => {
            ReportValue::Int(i64::try_from(v).map_err(|_| SanitizeError::IntegerOutOfRange(v))?)
        }
        ReportValue::Float32(v) => float(f64::from(v)),
        ReportValue::Timestamp(ts) => ReportValue::Str(format_iso(&ts)),
        ReportValue::FloatArray(values) => {
            ReportValue::Array(values.into_iter().map(float).collect())
        }
    })
}

fn float(v: f64) -> ReportValue {
    if v.is_finite() {
        ReportValue::Float(v)
    } else {
        ReportValue::Null
    }
}
