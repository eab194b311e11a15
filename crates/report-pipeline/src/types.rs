//! Core data types shared by the pipeline stages.

use crate::error::ComputationError;
use crate::reporting::{ReportValue, ToReportValue};
use crate::utils::{is_date_like_name, parse_datetime, round2};
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// Table
// ============================================================================

/// Semantic classification of a column, fixed at normalization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Numeric,
    Datetime,
    Categorical,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Datetime => "datetime",
            Self::Categorical => "categorical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub semantic_type: SemanticType,
}

/// A normalized, read-only table.
///
/// Numeric columns are stored as `Int64` or `Float64`, datetime columns as
/// ISO-8601 text, everything else as text. Rows stay in file order; stages
/// that need a different order sort their own copies.
#[derive(Debug, Clone)]
pub struct Table {
    frame: DataFrame,
    schema: Vec<ColumnSchema>,
}

impl Table {
    pub(crate) fn new(frame: DataFrame, schema: Vec<ColumnSchema>) -> Self {
        debug_assert_eq!(frame.width(), schema.len());
        Self { frame, schema }
    }

    /// The underlying frame.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    /// Column names in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.iter().any(|c| c.name == name)
    }

    pub fn semantic_type(&self, name: &str) -> Option<SemanticType> {
        self.schema
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.semantic_type)
    }

    /// Names of numeric columns, in file order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.schema
            .iter()
            .filter(|c| c.semantic_type == SemanticType::Numeric)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// The column used as the time axis.
    ///
    /// The first column whose name looks date-like (`date`, `time`, `day`)
    /// and that normalized to datetime wins; failing that, the first
    /// date-like text column. Numeric columns are never dates.
    pub fn date_column(&self) -> Option<&str> {
        let mut candidates = self
            .schema
            .iter()
            .filter(|c| is_date_like_name(&c.name) && c.semantic_type != SemanticType::Numeric);
        let first = candidates.clone().next();
        candidates
            .find(|c| c.semantic_type == SemanticType::Datetime)
            .or(first)
            .map(|c| c.name.as_str())
    }

    /// The x axis of the time-series chart: the date column, or else the
    /// first numeric column with a date-like name (a `day` counter).
    pub fn axis_column(&self) -> Option<&str> {
        self.date_column().or_else(|| {
            self.schema
                .iter()
                .find(|c| is_date_like_name(&c.name) && c.semantic_type == SemanticType::Numeric)
                .map(|c| c.name.as_str())
        })
    }

    fn series(&self, name: &str) -> Result<&Series, ComputationError> {
        self.frame
            .column(name)
            .map(|c| c.as_materialized_series())
            .map_err(|_| ComputationError::ColumnNotFound(name.to_string()))
    }

    /// A numeric column cast to `Float64`.
    pub fn float_column(&self, name: &str) -> Result<Float64Chunked, ComputationError> {
        let series = self.series(name)?.cast(&DataType::Float64)?;
        Ok(series.f64()?.clone())
    }

    /// Values of a numeric column as `f64`, with `None` for missing cells.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>, ComputationError> {
        Ok(self.float_column(name)?.into_iter().collect())
    }

    /// Values of a column read as timestamps, with `None` for missing cells.
    ///
    /// # Errors
    ///
    /// Returns [`ComputationError::DateParse`] for the first non-empty cell
    /// that is not a date.
    pub fn datetime_values(
        &self,
        name: &str,
    ) -> Result<Vec<Option<NaiveDateTime>>, ComputationError> {
        let series = self.series(name)?.cast(&DataType::String)?;
        series
            .str()?
            .into_iter()
            .map(|cell| match cell {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => parse_datetime(raw).map(Some).ok_or_else(|| {
                    ComputationError::DateParse {
                        column: name.to_string(),
                        value: raw.to_string(),
                    }
                }),
            })
            .collect()
    }

    /// Like [`Table::datetime_values`], but cells that are not dates read as
    /// `None` instead of failing.
    pub fn datetime_values_lossy(
        &self,
        name: &str,
    ) -> Result<Vec<Option<NaiveDateTime>>, ComputationError> {
        let series = self.series(name)?.cast(&DataType::String)?;
        Ok(series
            .str()?
            .into_iter()
            .map(|cell| cell.and_then(parse_datetime))
            .collect())
    }

    /// A single cell as a report value, keeping its integer/float identity.
    pub fn cell(&self, name: &str, row: usize) -> Result<ReportValue, ComputationError> {
        let value = self.series(name)?.get(row)?;
        any_value_to_report(name, value)
    }
}

/// Map a polars cell to the report tree.
///
/// Narrow and unsigned integers are kept as extended values and widened by
/// the sanitizer.
pub(crate) fn any_value_to_report(
    column: &str,
    value: AnyValue<'_>,
) -> Result<ReportValue, ComputationError> {
    Ok(match value {
        AnyValue::Null => ReportValue::Null,
        AnyValue::Boolean(v) => ReportValue::Bool(v),
        AnyValue::Int8(v) => ReportValue::Int32(i32::from(v)),
        AnyValue::Int16(v) => ReportValue::Int32(i32::from(v)),
        AnyValue::Int32(v) => ReportValue::Int32(v),
        AnyValue::Int64(v) => ReportValue::Int(v),
        AnyValue::UInt8(v) => ReportValue::Int(i64::from(v)),
        AnyValue::UInt16(v) => ReportValue::Int(i64::from(v)),
        AnyValue::UInt32(v) => ReportValue::Int(i64::from(v)),
        AnyValue::UInt64(v) => ReportValue::UInt64(v),
        AnyValue::Float32(v) => ReportValue::Float32(v),
        AnyValue::Float64(v) => ReportValue::Float(v),
        AnyValue::String(v) => ReportValue::Str(v.to_string()),
        AnyValue::StringOwned(v) => ReportValue::Str(v.to_string()),
        other => {
            return Err(ComputationError::UnsupportedValue {
                column: column.to_string(),
                dtype: other.dtype().to_string(),
            });
        }
    })
}

// ============================================================================
// Summary records
// ============================================================================

/// Descriptive statistics of one numeric column.
///
/// Quantiles use linear interpolation; `std` is the sample standard
/// deviation and is `None` with fewer than two values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl ToReportValue for ColumnStats {
    fn to_report_value(&self) -> ReportValue {
        ReportValue::object([
            ("count", ReportValue::from(self.count)),
            ("mean", self.mean.into()),
            ("std", self.std.into()),
            ("min", self.min.into()),
            ("25%", self.q1.into()),
            ("50%", self.median.into()),
            ("75%", self.q3.into()),
            ("max", self.max.into()),
        ])
    }
}

/// Rounded headline statistics carried by a numeric insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
    pub q1: f64,
    pub q3: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increased,
    Decreased,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increased => "increased",
            Self::Decreased => "decreased",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub direction: TrendDirection,
    pub amount: f64,
    pub pct_change: f64,
    /// `YYYY-MM-DD to YYYY-MM-DD`
    pub period: String,
}

/// A narrative finding about one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insight {
    Numeric {
        metric: String,
        stats: InsightStats,
        summary: String,
    },
    Trend {
        metric: String,
        trend: TrendSummary,
        summary: String,
    },
}

impl Insight {
    pub fn metric(&self) -> &str {
        match self {
            Self::Numeric { metric, .. } | Self::Trend { metric, .. } => metric,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            Self::Numeric { summary, .. } | Self::Trend { summary, .. } => summary,
        }
    }

    pub fn is_trend(&self) -> bool {
        matches!(self, Self::Trend { .. })
    }
}

impl ToReportValue for Insight {
    fn to_report_value(&self) -> ReportValue {
        match self {
            Self::Numeric {
                metric,
                stats,
                summary,
            } => ReportValue::object([
                ("metric", ReportValue::from(metric.as_str())),
                (
                    "stats",
                    ReportValue::object([
                        ("mean", ReportValue::Float(round2(stats.mean))),
                        ("min", ReportValue::Float(round2(stats.min))),
                        ("max", ReportValue::Float(round2(stats.max))),
                        ("std", ReportValue::Float(round2(stats.std))),
                        ("q1", ReportValue::Float(round2(stats.q1))),
                        ("q3", ReportValue::Float(round2(stats.q3))),
                    ]),
                ),
                ("summary", ReportValue::from(summary.as_str())),
            ]),
            Self::Trend {
                metric,
                trend,
                summary,
            } => ReportValue::object([
                ("metric", ReportValue::from(metric.as_str())),
                (
                    "trend",
                    ReportValue::object([
                        ("direction", ReportValue::from(trend.direction.as_str())),
                        ("amount", ReportValue::Float(trend.amount)),
                        ("pct_change", ReportValue::Float(trend.pct_change)),
                        ("period", ReportValue::from(trend.period.as_str())),
                    ]),
                ),
                ("summary", ReportValue::from(summary.as_str())),
            ]),
        }
    }
}

// ============================================================================
// Analysis records
// ============================================================================

/// The numeric values of a row flagged as an outlier, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyRecord {
    pub row: usize,
    pub score: f64,
    pub values: Vec<(String, ReportValue)>,
}

impl ToReportValue for AnomalyRecord {
    fn to_report_value(&self) -> ReportValue {
        ReportValue::Object(self.values.clone())
    }
}

/// One point of a forecast series.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDateTime,
    /// Historical points keep the cell's original representation.
    pub value: ReportValue,
    pub is_forecast: bool,
}

impl ToReportValue for ForecastPoint {
    fn to_report_value(&self) -> ReportValue {
        ReportValue::object([
            ("date", ReportValue::Timestamp(self.date)),
            ("value", self.value.clone()),
            ("is_forecast", ReportValue::Bool(self.is_forecast)),
        ])
    }
}

impl<T: ToReportValue> ToReportValue for [T] {
    fn to_report_value(&self) -> ReportValue {
        ReportValue::Array(self.iter().map(ToReportValue::to_report_value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let frame = df![
            "order_day" => ["2023-01-02", "2023-01-01"],
            "updated_time" => ["n/a", "later"],
            "amount" => [1i64, 2],
        ]
        .unwrap();
        Table::new(
            frame,
            vec![
                ColumnSchema {
                    name: "order_day".into(),
                    semantic_type: SemanticType::Datetime,
                },
                ColumnSchema {
                    name: "updated_time".into(),
                    semantic_type: SemanticType::Categorical,
                },
                ColumnSchema {
                    name: "amount".into(),
                    semantic_type: SemanticType::Numeric,
                },
            ],
        )
    }

    #[test]
    fn test_date_column_prefers_datetime_typed() {
        assert_eq!(sample_table().date_column(), Some("order_day"));
    }

    #[test]
    fn test_numeric_day_column_is_an_axis_not_a_date() {
        let table = Table::new(
            df!["day" => [1i64, 2, 3], "revenue" => [10i64, 20, 30]].unwrap(),
            vec![
                ColumnSchema {
                    name: "day".into(),
                    semantic_type: SemanticType::Numeric,
                },
                ColumnSchema {
                    name: "revenue".into(),
                    semantic_type: SemanticType::Numeric,
                },
            ],
        );
        assert_eq!(table.date_column(), None);
        assert_eq!(table.axis_column(), Some("day"));
        assert_eq!(sample_table().axis_column(), Some("order_day"));
    }

    #[test]
    fn test_numeric_columns() {
        let table = sample_table();
        assert_eq!(table.numeric_columns(), vec!["amount"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.semantic_type("amount"), Some(SemanticType::Numeric));
    }

    #[test]
    fn test_cell_keeps_integer_identity() {
        let table = sample_table();
        assert_eq!(table.cell("amount", 1).unwrap(), ReportValue::Int(2));
        assert!(matches!(
            table.cell("nope", 0),
            Err(ComputationError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_datetime_values_reports_bad_cell() {
        let table = sample_table();
        assert_eq!(table.datetime_values("order_day").unwrap().len(), 2);
        let err = table.datetime_values("updated_time").unwrap_err();
        assert!(matches!(err, ComputationError::DateParse { value, .. } if value == "n/a"));
    }

    #[test]
    fn test_insight_report_shape() {
        let insight = Insight::Trend {
            metric: "revenue".into(),
            trend: TrendSummary {
                direction: TrendDirection::Increased,
                amount: 120.0,
                pct_change: 120.0,
                period: "2023-01-01 to 2023-01-05".into(),
            },
            summary: "Over 4 days, revenue increased by 120.00 (120.00%).".into(),
        };
        let value = insight.to_report_value();
        assert_eq!(
            value
                .pointer(&["trend", "direction"])
                .and_then(ReportValue::as_str),
            Some("increased")
        );
    }
}
