//! Descriptive statistics and narrative insights.
//!
//! [`summarize`] computes `numeric_stats` for every numeric column, a numeric
//! insight for each column with non-zero spread and, when the table has a
//! date-like column and more than one row, a trend insight per other numeric
//! column with non-zero spread. [`enhance`] optionally hands the insight summaries to an
//! [`InsightEnhancer`] for a narrative rewrite.

mod insights;
pub(crate) mod statistics;

use crate::ai::InsightEnhancer;
use crate::error::ComputationError;
use crate::pipeline::StageOutcome;
use crate::types::{ColumnStats, Insight, Table};
use tracing::{debug, info, warn};

/// Statistics and insights for one table.
#[derive(Debug)]
pub struct NumericSummary {
    /// Per numeric column, in file order.
    pub numeric_stats: Vec<(String, ColumnStats)>,
    /// Numeric insights first, then trend insights.
    pub insights: Vec<Insight>,
    /// How trend insight generation went; carries the number of trend
    /// insights when computed.
    pub trend: StageOutcome<usize>,
}

impl NumericSummary {
    pub fn stats(&self, column: &str) -> Option<&ColumnStats> {
        self.numeric_stats
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, stats)| stats)
    }

    /// Insight summaries joined by newlines.
    pub fn insight_text(&self) -> String {
        self.insights
            .iter()
            .map(Insight::summary)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Summarize the numeric columns of a table.
///
/// Never fails. A numeric column that cannot be read is left out of
/// `numeric_stats`; a date column that cannot be parsed degrades only the
/// trend insights.
pub fn summarize(table: &Table) -> NumericSummary {
    let mut numeric_stats = Vec::new();
    let mut insights = Vec::new();

    for column in table.numeric_columns() {
        let values = match table.numeric_values(column) {
            Ok(values) => values,
            Err(e) => {
                warn!("Skipping statistics for '{}': {}", column, e);
                continue;
            }
        };
        let stats = statistics::describe(&values);
        debug!("Column '{}': {} values", column, stats.count);

        if let Some(insight) = insights::numeric_insight(column, &stats) {
            insights.push(insight);
        }
        numeric_stats.push((column.to_string(), stats));
    }

    let trend = match table.date_column() {
        None => StageOutcome::Skipped("no date-like column".to_string()),
        Some(_) if table.row_count() <= 1 => {
            StageOutcome::Skipped("need more than one row for trends".to_string())
        }
        Some(date_column) => match insights::trend_insights(table, date_column) {
            Ok(mut trends) => {
                // Flat columns get no insight of either kind.
                trends.retain(|t| {
                    numeric_stats.iter().any(|(name, stats)| {
                        name == t.metric() && stats.std.is_some_and(|s| s != 0.0)
                    })
                });
                let count = trends.len();
                insights.extend(trends);
                StageOutcome::Computed(count)
            }
            Err(e) => {
                warn!("Trend insights skipped: {}", e);
                StageOutcome::Degraded(e)
            }
        },
    };

    info!(
        "Summarized {} numeric columns into {} insights",
        numeric_stats.len(),
        insights.len()
    );

    NumericSummary {
        numeric_stats,
        insights,
        trend,
    }
}

/// Ask an enhancer to rewrite the insight summaries.
///
/// Skipped when there are no insights. Any enhancer failure is returned as
/// [`ComputationError::Enhancement`]; the structured insights are untouched
/// either way.
pub fn enhance(summary: &NumericSummary, enhancer: &dyn InsightEnhancer) -> StageOutcome<String> {
    if summary.insights.is_empty() {
        return StageOutcome::Skipped("no insights to enhance".to_string());
    }

    debug!("Enhancing {} insights with {}", summary.insights.len(), enhancer.name());
    match enhancer.enhance(&summary.insight_text()) {
        Ok(narrative) => StageOutcome::Computed(narrative),
        Err(e) => {
            warn!("{} enhancement failed, keeping basic insights: {}", enhancer.name(), e);
            StageOutcome::Degraded(ComputationError::Enhancement(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use anyhow::anyhow;
    use polars::prelude::*;

    struct Echo;

    impl InsightEnhancer for Echo {
        fn enhance(&self, insights: &str) -> anyhow::Result<String> {
            Ok(format!("Narrative: {}", insights.lines().count()))
        }

        fn name(&self) -> &str {
            "Echo"
        }
    }

    struct Offline;

    impl InsightEnhancer for Offline {
        fn enhance(&self, _insights: &str) -> anyhow::Result<String> {
            Err(anyhow!("service unavailable"))
        }

        fn name(&self) -> &str {
            "Offline"
        }
    }

    fn sales() -> Table {
        normalize(
            df![
                "date" => ["2023-01-01", "2023-01-02", "2023-01-03", "2023-01-04", "2023-01-05"],
                "revenue" => [100i64, 150, 200, 180, 220],
                "expenses" => [80i64, 90, 110, 95, 105],
                "flat" => [1i64, 1, 1, 1, 1],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_summarize_sales() {
        let summary = summarize(&sales());

        let names: Vec<&str> = summary.numeric_stats.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["revenue", "expenses", "flat"]);

        let metrics: Vec<(&str, bool)> = summary
            .insights
            .iter()
            .map(|i| (i.metric(), i.is_trend()))
            .collect();
        assert_eq!(
            metrics,
            vec![
                ("revenue", false),
                ("expenses", false),
                ("revenue", true),
                ("expenses", true),
            ]
        );
        assert_eq!(summary.trend.as_computed(), Some(&2));
        assert_eq!(summary.stats("flat").unwrap().std, Some(0.0));
    }

    #[test]
    fn test_summarize_without_date_column() {
        let table = normalize(df!["a" => [1.0f64, 2.0], "b" => [3i64, 5]].unwrap());
        let summary = summarize(&table);
        assert_eq!(summary.insights.len(), 2);
        assert!(matches!(summary.trend, StageOutcome::Skipped(_)));
    }

    #[test]
    fn test_summarize_single_row_has_no_trends() {
        let table = normalize(df!["date" => ["2023-01-01"], "x" => [1i64]].unwrap());
        let summary = summarize(&table);
        assert!(summary.insights.is_empty());
        assert!(matches!(summary.trend, StageOutcome::Skipped(_)));
    }

    #[test]
    fn test_summarize_bad_dates_keep_numeric_insights() {
        let table = normalize(
            df!["time_slot" => ["morning", "evening"], "visits" => [3i64, 7]].unwrap(),
        );
        let summary = summarize(&table);
        assert!(summary.trend.is_degraded());
        assert_eq!(summary.insights.len(), 1);
        assert!(!summary.insights[0].is_trend());
    }

    #[test]
    fn test_enhance_success_and_failure() {
        let summary = summarize(&sales());
        assert_eq!(enhance(&summary, &Echo).computed(), Some("Narrative: 4".to_string()));

        match enhance(&summary, &Offline) {
            StageOutcome::Degraded(ComputationError::Enhancement(msg)) => {
                assert!(msg.contains("unavailable"))
            }
            other => panic!("expected degraded enhancement, got {:?}", other),
        }
    }

    #[test]
    fn test_enhance_skips_empty_insights() {
        let table = normalize(df!["name" => ["a", "b"]].unwrap());
        let summary = summarize(&table);
        assert!(matches!(enhance(&summary, &Echo), StageOutcome::Skipped(_)));
    }
}
