//! Insight records derived from column statistics and date ordering.

use crate::error::ComputationError;
use crate::types::{ColumnStats, Insight, InsightStats, Table, TrendDirection, TrendSummary};
use crate::utils::{display_number, format_day, round2};
use chrono::NaiveDateTime;
use tracing::debug;

/// A numeric insight for a column, or `None` when its spread is zero or
/// undefined.
pub(crate) fn numeric_insight(column: &str, stats: &ColumnStats) -> Option<Insight> {
    let std = stats.std.filter(|s| *s != 0.0)?;
    let (mean, min, max) = (stats.mean?, stats.min?, stats.max?);
    let (q1, q3) = (stats.q1?, stats.q3?);

    let summary = format!(
        "The {} has an average of {} (range: {} to {}). Most values fall between {} and {}.",
        column,
        display_number(mean),
        display_number(min),
        display_number(max),
        display_number(q1),
        display_number(q3),
    );

    Some(Insight::Numeric {
        metric: column.to_string(),
        stats: InsightStats {
            mean: round2(mean),
            min: round2(min),
            max: round2(max),
            std: round2(std),
            q1: round2(q1),
            q3: round2(q3),
        },
        summary,
    })
}

/// First-vs-last trend insights for every numeric column except the date
/// column.
///
/// Rows without a date are ignored. The remaining rows are ordered by date
/// on a copy of their indices (stable, so ties keep file order).
///
/// # Errors
///
/// Returns [`ComputationError::DateParse`] when the date column holds a value
/// that is not a date.
pub(crate) fn trend_insights(
    table: &Table,
    date_column: &str,
) -> Result<Vec<Insight>, ComputationError> {
    let dates = table.datetime_values(date_column)?;

    let mut order: Vec<(usize, NaiveDateTime)> = dates
        .iter()
        .enumerate()
        .filter_map(|(row, date)| date.map(|d| (row, d)))
        .collect();
    order.sort_by_key(|(_, date)| *date);

    let (Some(&(_, start)), Some(&(_, end))) = (order.first(), order.last()) else {
        return Err(ComputationError::InsufficientData {
            column: date_column.to_string(),
            needed: 1,
            found: 0,
        });
    };
    let period = format!("{} to {}", format_day(&start), format_day(&end));
    let days = (end - start).num_days();

    let mut insights = Vec::new();
    for column in table.numeric_columns() {
        if column == date_column {
            continue;
        }
        let values = table.numeric_values(column)?;
        let mut ordered = order
            .iter()
            .filter_map(|(row, _)| values[*row].filter(|v| v.is_finite()));

        let Some(first) = ordered.next() else {
            debug!("No values for trend in '{}'", column);
            continue;
        };
        let last = ordered.last().unwrap_or(first);

        insights.push(trend_insight(column, first, last, days, &period));
    }

    Ok(insights)
}

fn trend_insight(column: &str, first: f64, last: f64, days: i64, period: &str) -> Insight {
    let change = last - first;
    let pct_change = if first == 0.0 {
        0.0
    } else {
        change / first * 100.0
    };
    let direction = if change > 0.0 {
        TrendDirection::Increased
    } else {
        TrendDirection::Decreased
    };

    let summary = format!(
        "Over {} days, {} {} by {:.2} ({:.2}%).",
        days,
        column,
        direction.as_str(),
        change.abs(),
        pct_change.abs()
    );

    Insight::Trend {
        metric: column.to_string(),
        trend: TrendSummary {
            direction,
            amount: round2(change.abs()),
            pct_change: round2(pct_change.abs()),
            period: period.to_string(),
        },
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::summary::statistics::describe;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn table(frame: DataFrame) -> Table {
        normalize(frame)
    }

    #[test]
    fn test_numeric_insight_text() {
        let stats = describe(&[Some(100.0), Some(150.0), Some(200.0), Some(180.0), Some(220.0)]);
        let insight = numeric_insight("revenue", &stats).unwrap();
        assert_eq!(
            insight.summary(),
            "The revenue has an average of 170.0 (range: 100.0 to 220.0). \
             Most values fall between 150.0 and 200.0."
        );
        assert_eq!(insight.metric(), "revenue");
    }

    #[test]
    fn test_numeric_insight_skips_constant_column() {
        let stats = describe(&[Some(5.0), Some(5.0), Some(5.0)]);
        assert!(numeric_insight("flat", &stats).is_none());

        let stats = describe(&[Some(5.0)]);
        assert!(numeric_insight("single", &stats).is_none());
    }

    #[test]
    fn test_trend_insights_sort_by_date() {
        let table = table(
            df![
                "date" => ["2023-01-05", "2023-01-01", "2023-01-03"],
                "revenue" => [220i64, 100, 200],
            ]
            .unwrap(),
        );

        let insights = trend_insights(&table, "date").unwrap();
        assert_eq!(insights.len(), 1);
        match &insights[0] {
            Insight::Trend { trend, summary, .. } => {
                assert_eq!(trend.direction, TrendDirection::Increased);
                assert_eq!(trend.amount, 120.0);
                assert_eq!(trend.pct_change, 120.0);
                assert_eq!(trend.period, "2023-01-01 to 2023-01-05");
                assert_eq!(summary, "Over 4 days, revenue increased by 120.00 (120.00%).");
            }
            other => panic!("expected trend insight, got {:?}", other),
        }
    }

    #[test]
    fn test_trend_zero_first_value_reports_zero_percent() {
        let table = table(
            df![
                "day" => ["2023-01-01", "2023-01-02"],
                "signups" => [0i64, 10],
            ]
            .unwrap(),
        );
        let insights = trend_insights(&table, "day").unwrap();
        match &insights[0] {
            Insight::Trend { trend, summary, .. } => {
                assert_eq!(trend.pct_change, 0.0);
                assert_eq!(summary, "Over 1 days, signups increased by 10.00 (0.00%).");
            }
            other => panic!("expected trend insight, got {:?}", other),
        }
    }

    #[test]
    fn test_trend_unchanged_is_decreased() {
        let table = table(
            df![
                "date" => ["2023-01-01", "2023-01-02"],
                "cost" => [5.5f64, 5.5],
            ]
            .unwrap(),
        );
        let insights = trend_insights(&table, "date").unwrap();
        match &insights[0] {
            Insight::Trend { trend, .. } => {
                assert_eq!(trend.direction, TrendDirection::Decreased);
                assert_eq!(trend.amount, 0.0);
            }
            other => panic!("expected trend insight, got {:?}", other),
        }
    }

    #[test]
    fn test_trend_rejects_unparseable_dates() {
        let table = table(
            df![
                "update_time" => ["soon", "later"],
                "value" => [1i64, 2],
            ]
            .unwrap(),
        );
        assert!(matches!(
            trend_insights(&table, "update_time"),
            Err(ComputationError::DateParse { .. })
        ));
    }
}
