//! Semantic type inference for raw columns.

use crate::types::SemanticType;
use crate::utils::{is_datetime_dtype, is_error_marker, is_numeric_dtype, parse_datetime, parse_numeric_string};
use polars::prelude::*;

/// Classify a raw column.
///
/// Precedence is datetime, then numeric, then categorical:
/// - native date/datetime dtypes, or text where every non-blank value is a date
/// - native numeric dtypes, or text where every non-blank value is a number
///   (missing-value markers such as `N/A` are tolerated)
/// - everything else, including booleans and all-null columns
pub(crate) fn infer_semantic_type(series: &Series) -> SemanticType {
    let dtype = series.dtype();

    if is_datetime_dtype(dtype) {
        return SemanticType::Datetime;
    }
    if is_numeric_dtype(dtype) {
        return SemanticType::Numeric;
    }

    let Ok(text) = series.str() else {
        return SemanticType::Categorical;
    };

    let values: Vec<&str> = text
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return SemanticType::Categorical;
    }

    if values.iter().all(|v| parse_datetime(v).is_some()) {
        return SemanticType::Datetime;
    }

    if is_numeric_text(&values) {
        return SemanticType::Numeric;
    }

    SemanticType::Categorical
}

/// All values are numbers or missing markers, with at least one number.
fn is_numeric_text(values: &[&str]) -> bool {
    let mut numeric = 0usize;
    for v in values {
        if parse_numeric_string(v).is_some() {
            numeric += 1;
        } else if !is_error_marker(v) {
            return false;
        }
    }
    numeric > 0
}
