use super::{ChartSpec, Layout, LineStyle, ScatterTrace, Trace};
use crate::config::ReportConfig;
use crate::error::ComputationError;
use crate::pipeline::StageOutcome;
use crate::reporting::ReportValue;
use crate::types::{ForecastPoint, SemanticType, Table};
use crate::utils::title_case;
use chrono::NaiveDateTime;

const ACTUAL_COLOR: &str = "#3b82f6";
const FORECAST_COLOR: &str = "#f59e0b";
const MODE: &str = "lines+markers";

/// Line chart of the designated value column over the table's axis column.
///
/// Skipped unless the table has both a date-like column and
/// `config.trend_value_column`. With a forecast for the value column the
/// chart has an `Actual` and a dotted `Forecast` trace; otherwise a single
/// trace over the rows with an x value, sorted by x. A numeric axis (a `day`
/// counter) is plotted as numbers.
pub fn time_series_chart(
    table: &Table,
    config: &ReportConfig,
    forecast: Option<&[ForecastPoint]>,
) -> StageOutcome<ChartSpec> {
    let value_column = config.trend_value_column.as_str();
    let Some(axis_column) = table.axis_column() else {
        return StageOutcome::Skipped("no date-like column".to_string());
    };
    if !table.has_column(value_column) {
        return StageOutcome::Skipped(format!("no '{}' column", value_column));
    }

    let data = match forecast {
        Some(points) => Ok(split_traces(points)),
        None if table.semantic_type(axis_column) == Some(SemanticType::Numeric) => {
            numeric_axis_trace(table, axis_column, value_column)
        }
        None => single_trace(table, axis_column, value_column),
    };

    data.map(|data| ChartSpec {
        data,
        layout: Layout {
            title: format!("{} Trend", title_case(value_column)),
            xaxis_title: axis_column.to_string(),
            yaxis_title: value_column.to_string(),
            hovermode: Some("x unified"),
            height: 500,
        },
    })
    .into()
}

fn split_traces(points: &[ForecastPoint]) -> Vec<Trace> {
    let (forecast, actual): (Vec<&ForecastPoint>, Vec<&ForecastPoint>) =
        points.iter().partition(|p| p.is_forecast);

    vec![
        scatter("Actual", &actual, ACTUAL_COLOR, None),
        scatter("Forecast", &forecast, FORECAST_COLOR, Some("dot")),
    ]
}

fn scatter(
    name: &str,
    points: &[&ForecastPoint],
    color: &'static str,
    dash: Option<&'static str>,
) -> Trace {
    Trace::Scatter(ScatterTrace {
        name: name.to_string(),
        x: points.iter().map(|p| ReportValue::Timestamp(p.date)).collect(),
        y: points.iter().map(|p| p.value.clone()).collect(),
        mode: MODE,
        line: LineStyle {
            color,
            width: 2,
            dash,
        },
    })
}

fn single_trace(
    table: &Table,
    date_column: &str,
    value_column: &str,
) -> Result<Vec<Trace>, ComputationError> {
    let mut rows: Vec<(usize, NaiveDateTime)> = table
        .datetime_values(date_column)?
        .into_iter()
        .enumerate()
        .filter_map(|(row, date)| date.map(|d| (row, d)))
        .collect();
    rows.sort_by_key(|(_, date)| *date);

    let x = rows.iter().map(|(_, date)| ReportValue::Timestamp(*date)).collect();
    value_trace(table, value_column, rows.iter().map(|(row, _)| *row), x)
}

fn numeric_axis_trace(
    table: &Table,
    axis_column: &str,
    value_column: &str,
) -> Result<Vec<Trace>, ComputationError> {
    let mut rows: Vec<(usize, f64)> = table
        .numeric_values(axis_column)?
        .into_iter()
        .enumerate()
        .filter_map(|(row, x)| x.filter(|x| x.is_finite()).map(|x| (row, x)))
        .collect();
    rows.sort_by(|(_, a), (_, b)| a.total_cmp(b));

    let x = rows
        .iter()
        .map(|(row, _)| table.cell(axis_column, *row))
        .collect::<Result<Vec<_>, _>>()?;
    value_trace(table, value_column, rows.iter().map(|(row, _)| *row), x)
}

fn value_trace(
    table: &Table,
    value_column: &str,
    rows: impl Iterator<Item = usize>,
    x: Vec<ReportValue>,
) -> Result<Vec<Trace>, ComputationError> {
    let y = rows
        .map(|row| table.cell(value_column, row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(vec![Trace::Scatter(ScatterTrace {
        name: value_column.to_string(),
        x,
        y,
        mode: MODE,
        line: LineStyle {
            color: ACTUAL_COLOR,
            width: 2,
            dash: None,
        },
    })])
}
