//! Column coercions applied once a column's semantic type is known.

use crate::utils::{format_iso, is_error_marker, parse_datetime, parse_numeric_string};
use polars::prelude::*;

/// Rewrite a date-like column as ISO-8601 text.
///
/// Native `Date`/`Datetime` columns are rendered through their string cast
/// first. Cells that cannot be read as a date become null.
pub(crate) fn to_iso_text(series: &Series) -> PolarsResult<Series> {
    let text = series.cast(&DataType::String)?;
    let str_series = text.str()?;

    let result_vec: Vec<Option<String>> = str_series
        .into_iter()
        .map(|opt_val| opt_val.and_then(parse_datetime).map(|dt| format_iso(&dt)))
        .collect();

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Widen a native numeric column to `Int64` or `Float64`.
///
/// `UInt64` values above `i64::MAX` force the whole column to `Float64`.
pub(crate) fn widen_numeric(series: &Series) -> PolarsResult<Series> {
    match series.dtype() {
        DataType::Float32 | DataType::Float64 => series.cast(&DataType::Float64),
        DataType::UInt64 => {
            let fits = series
                .u64()?
                .into_iter()
                .flatten()
                .all(|v| i64::try_from(v).is_ok());
            if fits {
                series.strict_cast(&DataType::Int64)
            } else {
                series.cast(&DataType::Float64)
            }
        }
        _ => series.strict_cast(&DataType::Int64),
    }
}

/// Convert a text column of formatted numbers.
///
/// Blanks and missing-value markers become null. The result is `Int64` when
/// every value is integral, fits, and was written without a decimal point;
/// otherwise `Float64`.
pub(crate) fn text_to_numeric(series: &Series) -> PolarsResult<Series> {
    let str_series = series.str()?;

    let mut result_vec: Vec<Option<f64>> = Vec::with_capacity(str_series.len());
    let mut integral = true;

    for opt_val in str_series.into_iter() {
        match opt_val {
            Some(val) => {
                let trimmed = val.trim();

                if trimmed.is_empty() || is_error_marker(trimmed) {
                    result_vec.push(None);
                    continue;
                }

                let parsed = parse_numeric_string(trimmed);
                if let Some(v) = parsed {
                    if trimmed.contains('.')
                        || v.fract() != 0.0
                        || v.abs() > (i64::MAX as f64) / 2.0
                    {
                        integral = false;
                    }
                }
                result_vec.push(parsed);
            }
            None => result_vec.push(None),
        }
    }

    if integral {
        let ints: Vec<Option<i64>> = result_vec.iter().map(|v| v.map(|f| f as i64)).collect();
        Ok(Series::new(series.name().clone(), ints))
    } else {
        Ok(Series::new(series.name().clone(), result_vec))
    }
}

/// Render any column as text.
///
/// Uses the polars string cast where it exists, and each cell's display form
/// otherwise.
pub(crate) fn to_text(series: &Series) -> Series {
    if let Ok(text) = series.cast(&DataType::String) {
        return text;
    }

    let values: Vec<Option<String>> = (0..series.len())
        .map(|idx| match series.get(idx) {
            Ok(AnyValue::Null) | Err(_) => None,
            Ok(other) => Some(other.to_string()),
        })
        .collect();
    Series::new(series.name().clone(), values)
}
