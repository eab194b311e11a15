//! Model-based analysis: outlier rows and short-horizon forecasts.

pub mod anomaly;
pub mod forecast;

pub use anomaly::detect_anomalies;
pub use forecast::{LinearTrend, forecast_column};

use crate::config::ReportConfig;
use crate::pipeline::StageOutcome;
use crate::types::{ForecastPoint, Table};
use tracing::{info, warn};

/// Forecast every numeric column other than the date column.
///
/// Returns one outcome per numeric column, in file order. When the table has
/// no date column, or not more than `config.forecast_min_rows` rows, the
/// result is empty.
pub fn forecast_all(
    table: &Table,
    config: &ReportConfig,
) -> Vec<(String, StageOutcome<Vec<ForecastPoint>>)> {
    let Some(date_column) = table.date_column() else {
        info!("No date-like column, skipping forecasts");
        return Vec::new();
    };
    if table.row_count() <= config.forecast_min_rows {
        info!(
            "Skipping forecasts: {} rows (need more than {})",
            table.row_count(),
            config.forecast_min_rows
        );
        return Vec::new();
    }

    table
        .numeric_columns()
        .into_iter()
        .filter(|column| *column != date_column)
        .map(|column| {
            let outcome: StageOutcome<_> =
                forecast_column(table, column, date_column, config).into();
            if let StageOutcome::Degraded(e) = &outcome {
                warn!("Forecast for '{}' omitted: {}", column, e);
            }
            (column.to_string(), outcome)
        })
        .collect()
}
