//! Type normalization.
//!
//! Classifies every column of a freshly loaded frame as numeric, datetime or
//! categorical and rewrites it in the canonical storage form for that type:
//!
//! | Semantic type | Storage                                   |
//! |---------------|-------------------------------------------|
//! | numeric       | `Int64` or `Float64`                      |
//! | datetime      | ISO-8601 text (`2023-01-05T00:00:00`)     |
//! | categorical   | text                                      |
//!
//! Normalization never fails. A column whose coercion errors is kept as
//! categorical text and a warning is logged.

mod converters;
mod type_inference;

use crate::types::{ColumnSchema, SemanticType, Table};
use crate::utils::is_numeric_dtype;
use converters::{text_to_numeric, to_iso_text, to_text, widen_numeric};
use polars::prelude::*;
use tracing::{debug, info, warn};
use type_inference::infer_semantic_type;

/// Normalize a raw frame into a [`Table`].
pub fn normalize(frame: DataFrame) -> Table {
    let mut columns = Vec::with_capacity(frame.width());
    let mut schema = Vec::with_capacity(frame.width());

    for column in frame.get_columns() {
        let series = column.as_materialized_series();
        let (converted, semantic_type) = normalize_series(series);
        debug!(
            "Column '{}': {} -> {} ({})",
            series.name(),
            series.dtype(),
            semantic_type.as_str(),
            converted.dtype()
        );
        schema.push(ColumnSchema {
            name: series.name().to_string(),
            semantic_type,
        });
        columns.push(Column::from(converted));
    }

    match DataFrame::new(columns) {
        Ok(normalized) => {
            info!(
                "Normalized {} columns ({} numeric)",
                schema.len(),
                schema
                    .iter()
                    .filter(|c| c.semantic_type == SemanticType::Numeric)
                    .count()
            );
            Table::new(normalized, schema)
        }
        Err(e) => {
            warn!("Could not rebuild normalized frame, treating all columns as text: {}", e);
            fallback_table(frame)
        }
    }
}

fn normalize_series(series: &Series) -> (Series, SemanticType) {
    let semantic_type = infer_semantic_type(series);

    let converted = match semantic_type {
        SemanticType::Datetime => to_iso_text(series),
        SemanticType::Numeric if is_numeric_dtype(series.dtype()) => widen_numeric(series),
        SemanticType::Numeric => text_to_numeric(series),
        SemanticType::Categorical => Ok(to_text(series)),
    };

    match converted {
        Ok(converted) => (converted, semantic_type),
        Err(e) => {
            warn!(
                "Coercing column '{}' to {} failed, keeping it as text: {}",
                series.name(),
                semantic_type.as_str(),
                e
            );
            (to_text(series), SemanticType::Categorical)
        }
    }
}

fn fallback_table(frame: DataFrame) -> Table {
    let schema = frame
        .get_column_names()
        .iter()
        .map(|name| ColumnSchema {
            name: name.to_string(),
            semantic_type: SemanticType::Categorical,
        })
        .collect();
    Table::new(frame, schema)
}
