use super::value::{ReportValue, ToReportValue};
use crate::charts::ChartSpec;
use crate::summary::NumericSummary;
use crate::types::{AnomalyRecord, ForecastPoint, Table};

/// Everything the artifact is built from. Optional parts that are `None`
/// (or empty) leave their key out of the artifact.
pub struct ReportParts<'a> {
    pub table: &'a Table,
    pub summary: &'a NumericSummary,
    pub narrative: Option<&'a str>,
    pub anomalies: Option<&'a [AnomalyRecord]>,
    /// `(column, points)` per forecast column, in file order.
    pub forecasts: Vec<(&'a str, &'a [ForecastPoint])>,
    pub value_column: &'a str,
    pub time_series: Option<&'a ChartSpec>,
    pub correlation: Option<&'a ChartSpec>,
}

/// Build the unsanitized artifact tree:
///
/// ```text
/// {
///   summary_stats:  {row_count, columns, numeric_stats, insights, narrative?},
///   ai_analysis:    {anomalies?, <col>_forecast?...},
///   visualizations: {<value>_trend?, correlation_matrix?}
/// }
/// ```
pub fn assemble(parts: &ReportParts<'_>) -> ReportValue {
    let mut summary_stats = vec![
        (
            "row_count".to_string(),
            ReportValue::from(parts.table.row_count()),
        ),
        (
            "columns".to_string(),
            ReportValue::from(parts.table.column_names()),
        ),
        (
            "numeric_stats".to_string(),
            ReportValue::object(
                parts
                    .summary
                    .numeric_stats
                    .iter()
                    .map(|(name, stats)| (name.as_str(), stats.to_report_value())),
            ),
        ),
        (
            "insights".to_string(),
            parts.summary.insights.to_report_value(),
        ),
    ];
    if let Some(narrative) = parts.narrative {
        summary_stats.push(("narrative".to_string(), ReportValue::from(narrative)));
    }

    let mut ai_analysis = Vec::new();
    if let Some(anomalies) = parts.anomalies.filter(|a| !a.is_empty()) {
        ai_analysis.push(("anomalies".to_string(), anomalies.to_report_value()));
    }
    for (column, points) in &parts.forecasts {
        ai_analysis.push((format!("{}_forecast", column), points.to_report_value()));
    }

    let mut visualizations = Vec::new();
    if let Some(chart) = parts.time_series {
        visualizations.push((
            format!("{}_trend", parts.value_column),
            chart.to_report_value(),
        ));
    }
    if let Some(chart) = parts.correlation {
        visualizations.push(("correlation_matrix".to_string(), chart.to_report_value()));
    }

    ReportValue::object([
        ("summary_stats", ReportValue::Object(summary_stats)),
        ("ai_analysis", ReportValue::Object(ai_analysis)),
        ("visualizations", ReportValue::Object(visualizations)),
    ])
}
