//! Configuration for the report pipeline.
//!
//! The library never reads the environment; everything it needs is carried
//! in a [`ReportConfig`] built by the caller.

use serde::{Deserialize, Serialize};

/// Tuning knobs for the analysis stages.
///
/// Use [`ReportConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use report_pipeline::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .contamination(0.1)
///     .trend_value_column("sales")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Expected fraction of outlier rows (0.0 - 0.5].
    /// Default: 0.05
    pub contamination: f64,

    /// Minimum row count for anomaly detection to run.
    /// Default: 10
    pub anomaly_min_rows: usize,

    /// Number of isolation trees.
    /// Default: 100
    pub n_estimators: usize,

    /// Upper bound on the rows drawn for each tree.
    /// Default: 256
    pub max_samples: usize,

    /// Seed for every random draw in the pipeline.
    /// Default: 42
    pub random_seed: u64,

    /// Forecasts run only when the table has strictly more rows than this.
    /// Default: 10
    pub forecast_min_rows: usize,

    /// Number of future days to project.
    /// Default: 3
    pub forecast_horizon_days: usize,

    /// Minimum usable (date, value) points for a forecast.
    /// Default: 3
    pub min_forecast_points: usize,

    /// Column plotted by the time-series chart.
    /// Default: "revenue"
    pub trend_value_column: String,

    /// Whether to call the narrative enhancer when one is installed.
    /// Default: true
    pub enhance_insights: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            contamination: 0.05,
            anomaly_min_rows: 10,
            n_estimators: 100,
            max_samples: 256,
            random_seed: 42,
            forecast_min_rows: 10,
            forecast_horizon_days: 3,
            min_forecast_points: 3,
            trend_value_column: "revenue".to_string(),
            enhance_insights: true,
        }
    }
}

impl ReportConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ConfigValidationError::InvalidContamination(
                self.contamination,
            ));
        }

        if self.n_estimators == 0 {
            return Err(ConfigValidationError::TooSmall {
                field: "n_estimators",
                value: self.n_estimators,
                min: 1,
            });
        }

        if self.max_samples < 2 {
            return Err(ConfigValidationError::TooSmall {
                field: "max_samples",
                value: self.max_samples,
                min: 2,
            });
        }

        if self.forecast_horizon_days == 0 {
            return Err(ConfigValidationError::TooSmall {
                field: "forecast_horizon_days",
                value: self.forecast_horizon_days,
                min: 1,
            });
        }

        if self.min_forecast_points < 2 {
            return Err(ConfigValidationError::TooSmall {
                field: "min_forecast_points",
                value: self.min_forecast_points,
                min: 2,
            });
        }

        if self.trend_value_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyValueColumn);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid contamination: {0} (must be in (0.0, 0.5])")]
    InvalidContamination(f64),

    #[error("Invalid value for '{field}': {value} (must be at least {min})")]
    TooSmall {
        field: &'static str,
        value: usize,
        min: usize,
    },

    #[error("Trend value column must not be empty")]
    EmptyValueColumn,
}

/// Builder for [`ReportConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ReportConfigBuilder {
    contamination: Option<f64>,
    anomaly_min_rows: Option<usize>,
    n_estimators: Option<usize>,
    max_samples: Option<usize>,
    random_seed: Option<u64>,
    forecast_min_rows: Option<usize>,
    forecast_horizon_days: Option<usize>,
    min_forecast_points: Option<usize>,
    trend_value_column: Option<String>,
    enhance_insights: Option<bool>,
}

impl ReportConfigBuilder {
    /// Set the expected outlier fraction.
    pub fn contamination(mut self, contamination: f64) -> Self {
        self.contamination = Some(contamination);
        self
    }

    /// Set the minimum row count for anomaly detection.
    pub fn anomaly_min_rows(mut self, rows: usize) -> Self {
        self.anomaly_min_rows = Some(rows);
        self
    }

    /// Set the number of isolation trees.
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = Some(n);
        self
    }

    /// Set the per-tree subsample cap.
    pub fn max_samples(mut self, n: usize) -> Self {
        self.max_samples = Some(n);
        self
    }

    /// Set the random seed.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Forecasts run only for tables with more rows than this.
    pub fn forecast_min_rows(mut self, rows: usize) -> Self {
        self.forecast_min_rows = Some(rows);
        self
    }

    /// Set the number of projected days.
    pub fn forecast_horizon_days(mut self, days: usize) -> Self {
        self.forecast_horizon_days = Some(days);
        self
    }

    /// Set the minimum usable points for a forecast.
    pub fn min_forecast_points(mut self, points: usize) -> Self {
        self.min_forecast_points = Some(points);
        self
    }

    /// Set the column plotted by the time-series chart.
    pub fn trend_value_column(mut self, column: impl Into<String>) -> Self {
        self.trend_value_column = Some(column.into());
        self
    }

    /// Enable or disable the narrative enhancer.
    pub fn enhance_insights(mut self, enhance: bool) -> Self {
        self.enhance_insights = Some(enhance);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ReportConfig` or an error if validation fails.
    pub fn build(self) -> Result<ReportConfig, ConfigValidationError> {
        let defaults = ReportConfig::default();
        let config = ReportConfig {
            contamination: self.contamination.unwrap_or(defaults.contamination),
            anomaly_min_rows: self.anomaly_min_rows.unwrap_or(defaults.anomaly_min_rows),
            n_estimators: self.n_estimators.unwrap_or(defaults.n_estimators),
            max_samples: self.max_samples.unwrap_or(defaults.max_samples),
            random_seed: self.random_seed.unwrap_or(defaults.random_seed),
            forecast_min_rows: self.forecast_min_rows.unwrap_or(defaults.forecast_min_rows),
            forecast_horizon_days: self
                .forecast_horizon_days
                .unwrap_or(defaults.forecast_horizon_days),
            min_forecast_points: self
                .min_forecast_points
                .unwrap_or(defaults.min_forecast_points),
            trend_value_column: self
                .trend_value_column
                .unwrap_or(defaults.trend_value_column),
            enhance_insights: self.enhance_insights.unwrap_or(defaults.enhance_insights),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.contamination, 0.05);
        assert_eq!(config.anomaly_min_rows, 10);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.forecast_horizon_days, 3);
        assert_eq!(config.trend_value_column, "revenue");
        assert!(config.enhance_insights);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ReportConfig::builder()
            .contamination(0.1)
            .n_estimators(50)
            .random_seed(7)
            .trend_value_column("sales")
            .enhance_insights(false)
            .build()
            .unwrap();

        assert_eq!(config.contamination, 0.1);
        assert_eq!(config.n_estimators, 50);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.trend_value_column, "sales");
        assert!(!config.enhance_insights);
        // untouched fields keep their defaults
        assert_eq!(config.max_samples, 256);
    }

    #[test]
    fn test_validation_invalid_contamination() {
        let result = ReportConfig::builder().contamination(0.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidContamination(_)
        ));

        let result = ReportConfig::builder().contamination(0.75).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_too_small() {
        let result = ReportConfig::builder().max_samples(1).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::TooSmall {
                field: "max_samples",
                ..
            }
        ));

        let result = ReportConfig::builder().forecast_horizon_days(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_empty_value_column() {
        let result = ReportConfig::builder().trend_value_column("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyValueColumn
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "contamination": 0.02,
            "anomaly_min_rows": 20,
            "n_estimators": 25,
            "max_samples": 64,
            "random_seed": 1,
            "forecast_min_rows": 5,
            "forecast_horizon_days": 7,
            "min_forecast_points": 4,
            "trend_value_column": "sales",
            "enhance_insights": false
        }"#;

        let config: ReportConfig = serde_json::from_str(json).expect("valid config JSON");
        assert_eq!(config.contamination, 0.02);
        assert_eq!(config.forecast_horizon_days, 7);
        assert_eq!(config.trend_value_column, "sales");
        assert!(config.validate().is_ok());
    }
}
