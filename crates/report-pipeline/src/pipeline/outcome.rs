//! Per-stage results of a report run.
//!
//! Optional stages never abort the run. Each one ends in a [`StageOutcome`]:
//! it computed a value, it had nothing to do, or it failed and its artifact
//! key is left out. The pipeline keeps a [`StageRecord`] per stage so callers
//! can see why a key is missing.

use crate::error::ComputationError;
use serde::{Deserialize, Serialize};

/// Stages of the report pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStage {
    /// Parsing the upload
    Loading,
    /// Classifying and coercing columns
    Normalization,
    /// Descriptive statistics and numeric insights
    Summary,
    /// First-vs-last trend insights
    TrendInsights,
    /// Narrative rewrite of the insights
    Enhancement,
    /// Isolation-forest outlier rows
    AnomalyDetection,
    /// Linear projection of one numeric column
    Forecast,
    /// Time-series chart of the value column
    TimeSeriesChart,
    /// Correlation heat map
    CorrelationChart,
    /// Building and sanitizing the artifact
    Assembly,
}

impl ReportStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading File",
            Self::Normalization => "Normalizing Types",
            Self::Summary => "Summarizing",
            Self::TrendInsights => "Trend Insights",
            Self::Enhancement => "Enhancing Narrative",
            Self::AnomalyDetection => "Detecting Anomalies",
            Self::Forecast => "Forecasting",
            Self::TimeSeriesChart => "Time Series Chart",
            Self::CorrelationChart => "Correlation Chart",
            Self::Assembly => "Assembling Report",
        }
    }
}

/// Result of an optional stage.
#[derive(Debug)]
pub enum StageOutcome<T> {
    /// The stage produced a value.
    Computed(T),
    /// Preconditions were not met; not an error.
    Skipped(String),
    /// The stage failed; the pipeline continues without its output.
    Degraded(ComputationError),
}

impl<T> StageOutcome<T> {
    /// The computed value, if any.
    pub fn computed(self) -> Option<T> {
        match self {
            Self::Computed(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_computed(&self) -> Option<&T> {
        match self {
            Self::Computed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// Summarize this outcome for the run's stage list.
    pub fn record(&self, stage: ReportStage, target: Option<&str>) -> StageRecord {
        let (status, detail) = match self {
            Self::Computed(_) => (StageStatus::Computed, None),
            Self::Skipped(reason) => (StageStatus::Skipped, Some(reason.clone())),
            Self::Degraded(error) => (StageStatus::Degraded, Some(error.to_string())),
        };
        StageRecord {
            stage,
            target: target.map(str::to_string),
            status,
            error_code: match self {
                Self::Degraded(error) => Some(error.error_code().to_string()),
                _ => None,
            },
            detail,
        }
    }
}

impl<T> From<Result<T, ComputationError>> for StageOutcome<T> {
    fn from(result: Result<T, ComputationError>) -> Self {
        match result {
            Ok(value) => Self::Computed(value),
            Err(error) => Self::Degraded(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Computed,
    Skipped,
    Degraded,
}

/// What happened in one stage of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: ReportStage,
    /// Column the stage ran for, when it runs per column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Skip reason or error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StageRecord {
    /// A stage that always runs and succeeded.
    pub(crate) fn completed(stage: ReportStage) -> Self {
        Self {
            stage,
            target: None,
            status: StageStatus::Computed,
            error_code: None,
            detail: None,
        }
    }
}
