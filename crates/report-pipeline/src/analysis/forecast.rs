//! Short-horizon linear trend projection.
//!
//! The time axis is the whole-day offset of each row from the earliest date,
//! standardized to zero mean and unit (population) variance. The line through
//! `(z, y)` is the least squares solution of the `[1, z]` design matrix, then
//! evaluated one day at a time past the last observed date.

use crate::config::ReportConfig;
use crate::error::ComputationError;
use crate::summary::statistics::{mean, population_std};
use crate::types::{ForecastPoint, Table};
use chrono::{Duration, NaiveDateTime};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Singular values below these are treated as zero, strictest first.
const SVD_TOLERANCES: [f64; 3] = [1e-10, 1e-8, 1e-6];

/// Fitted `y = intercept + slope * z` over standardized day offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub intercept: f64,
    pub slope: f64,
    offset_mean: f64,
    offset_scale: f64,
}

impl LinearTrend {
    /// Fit against raw day offsets.
    ///
    /// An offset spread of zero leaves the offsets unscaled. The design matrix
    /// is then rank one and the minimum-norm solution is a flat line through
    /// the mean.
    pub fn fit(offsets: &[f64], values: &[f64]) -> Result<Self, ComputationError> {
        if offsets.len() != values.len() {
            return Err(ComputationError::FitFailed(format!(
                "{} offsets for {} values",
                offsets.len(),
                values.len()
            )));
        }
        let (Some(offset_mean), Some(offset_std)) = (mean(offsets), population_std(offsets))
        else {
            return Err(ComputationError::FitFailed("no observations".to_string()));
        };
        let offset_scale = if offset_std == 0.0 { 1.0 } else { offset_std };

        let design = DMatrix::from_fn(offsets.len(), 2, |row, col| match col {
            0 => 1.0,
            _ => (offsets[row] - offset_mean) / offset_scale,
        });
        let observed = DVector::from_column_slice(values);

        let beta = solve_least_squares(&design, &observed).ok_or_else(|| {
            ComputationError::FitFailed("regression coefficients are not finite".to_string())
        })?;

        Ok(Self {
            intercept: beta[0],
            slope: beta[1],
            offset_mean,
            offset_scale,
        })
    }

    /// Predict the value at a raw day offset.
    pub fn predict(&self, offset: f64) -> f64 {
        self.intercept + self.slope * (offset - self.offset_mean) / self.offset_scale
    }
}

/// SVD least squares, loosening the tolerance until the solution is finite.
fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    SVD_TOLERANCES.iter().find_map(|&tol| {
        svd.solve(y, tol)
            .ok()
            .filter(|beta| beta.iter().all(|v| v.is_finite()))
    })
}

/// Project `target` against `date_column`.
///
/// Usable points are rows with a readable date and a finite value, ordered by
/// date (stable). Returns those historical points followed by
/// `config.forecast_horizon_days` projected points, one per day after the
/// last observed date. Historical values keep the cell's integer or float
/// representation.
///
/// # Errors
///
/// - [`ComputationError::ColumnNotFound`] if either column is missing
/// - [`ComputationError::InsufficientData`] with fewer than
///   `config.min_forecast_points` usable points
/// - [`ComputationError::FitFailed`] if the fit or a prediction is not finite
pub fn forecast_column(
    table: &Table,
    target: &str,
    date_column: &str,
    config: &ReportConfig,
) -> Result<Vec<ForecastPoint>, ComputationError> {
    for column in [target, date_column] {
        if !table.has_column(column) {
            return Err(ComputationError::ColumnNotFound(column.to_string()));
        }
    }

    let dates = table.datetime_values_lossy(date_column)?;
    let values = table.numeric_values(target)?;

    let mut usable: Vec<(usize, NaiveDateTime, f64)> = dates
        .into_iter()
        .zip(values)
        .enumerate()
        .filter_map(|(row, (date, value))| match (date, value) {
            (Some(d), Some(v)) if v.is_finite() => Some((row, d, v)),
            _ => None,
        })
        .collect();
    usable.sort_by_key(|(_, date, _)| *date);

    let (Some(&(_, start, _)), Some(&(_, end, _))) = (usable.first(), usable.last()) else {
        return Err(insufficient(target, config, 0));
    };
    if usable.len() < config.min_forecast_points {
        return Err(insufficient(target, config, usable.len()));
    }
    let offsets: Vec<f64> = usable
        .iter()
        .map(|(_, date, _)| (*date - start).num_days() as f64)
        .collect();
    let observed: Vec<f64> = usable.iter().map(|(_, _, v)| *v).collect();

    let trend = LinearTrend::fit(&offsets, &observed)?;
    debug!(
        "Trend for '{}': intercept {:.4}, slope {:.4} over {} points",
        target,
        trend.intercept,
        trend.slope,
        usable.len()
    );

    let mut points = Vec::with_capacity(usable.len() + config.forecast_horizon_days);
    for (row, date, _) in &usable {
        points.push(ForecastPoint {
            date: *date,
            value: table.cell(target, *row)?,
            is_forecast: false,
        });
    }

    let last_offset = (end - start).num_days() as f64;
    for day in 1..=config.forecast_horizon_days {
        let predicted = trend.predict(last_offset + day as f64);
        if !predicted.is_finite() {
            return Err(ComputationError::FitFailed(format!(
                "prediction for day +{} is not finite",
                day
            )));
        }
        points.push(ForecastPoint {
            date: end + Duration::days(day as i64),
            value: predicted.into(),
            is_forecast: true,
        });
    }

    Ok(points)
}

fn insufficient(target: &str, config: &ReportConfig, found: usize) -> ComputationError {
    ComputationError::InsufficientData {
        column: target.to_string(),
        needed: config.min_forecast_points,
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::reporting::ReportValue;
    use crate::utils::format_day;
    use polars::prelude::*;

    fn dates(n: usize) -> Vec<String> {
        (1..=n).map(|d| format!("2023-01-{:02}", d)).collect()
    }

    #[test]
    fn test_linear_trend_recovers_line() {
        let offsets = [0.0, 1.0, 2.0, 3.0, 4.0];
        let values = [10.0, 12.0, 14.0, 16.0, 18.0];
        let trend = LinearTrend::fit(&offsets, &values).unwrap();
        assert!((trend.predict(5.0) - 20.0).abs() < 1e-9);
        assert!((trend.predict(7.0) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_trend_constant_offsets() {
        let trend = LinearTrend::fit(&[3.0, 3.0, 3.0], &[1.0, 2.0, 6.0]).unwrap();
        assert!(trend.slope.abs() < 1e-12);
        assert!((trend.predict(10.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_trend_least_squares_on_noisy_points() {
        // y = 1 + 2x with residuals +1, -1, -1, +1
        let trend = LinearTrend::fit(&[0.0, 1.0, 2.0, 3.0], &[2.0, 2.0, 4.0, 8.0]).unwrap();
        assert!((trend.predict(0.0) - 1.0).abs() < 1e-9);
        assert!((trend.predict(3.0) - 7.0).abs() < 1e-9);
        assert!((trend.intercept - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_trend_rejects_bad_input() {
        assert!(matches!(
            LinearTrend::fit(&[], &[]),
            Err(ComputationError::FitFailed(_))
        ));
        assert!(matches!(
            LinearTrend::fit(&[0.0, 1.0], &[1.0]),
            Err(ComputationError::FitFailed(_))
        ));
        assert!(matches!(
            LinearTrend::fit(&[0.0, 1.0, 2.0], &[1.0, f64::NAN, 3.0]),
            Err(ComputationError::FitFailed(_))
        ));
    }

    #[test]
    fn test_forecast_linear_series() {
        let n = 15;
        let revenue: Vec<i64> = (0..n as i64).map(|i| 100 + 10 * i).collect();
        let table = normalize(df!["date" => dates(n), "revenue" => revenue].unwrap());

        let points = forecast_column(&table, "revenue", "date", &ReportConfig::default()).unwrap();
        assert_eq!(points.len(), n + 3);
        assert!(points[..n].iter().all(|p| !p.is_forecast));
        assert_eq!(points[0].value, ReportValue::Int(100));

        let future: Vec<&ForecastPoint> = points.iter().filter(|p| p.is_forecast).collect();
        assert_eq!(future.len(), 3);
        for (i, point) in future.iter().enumerate() {
            let expected = 100.0 + 10.0 * (n + i) as f64;
            let value = point.value.as_f64().unwrap();
            assert!((value - expected).abs() < 1e-6, "day +{}: {}", i + 1, value);
        }
        assert_eq!(format_day(&future[0].date), "2023-01-16");
        assert_eq!(format_day(&future[2].date), "2023-01-18");
    }

    #[test]
    fn test_forecast_sorts_by_date() {
        let table = normalize(
            df![
                "date" => ["2023-01-03", "2023-01-01", "2023-01-02"],
                "units" => [30i64, 10, 20],
            ]
            .unwrap(),
        );
        let points = forecast_column(&table, "units", "date", &ReportConfig::default()).unwrap();
        let history: Vec<ReportValue> = points[..3].iter().map(|p| p.value.clone()).collect();
        assert_eq!(
            history,
            vec![ReportValue::Int(10), ReportValue::Int(20), ReportValue::Int(30)]
        );
        assert!((points[3].value.as_f64().unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_ignores_missing_values() {
        let table = normalize(
            df![
                "date" => ["2023-01-01", "2023-01-02", "2023-01-03", "2023-01-04"],
                "units" => [Some(1.0f64), None, Some(3.0), Some(4.0)],
            ]
            .unwrap(),
        );
        let points = forecast_column(&table, "units", "date", &ReportConfig::default()).unwrap();
        assert_eq!(points.iter().filter(|p| !p.is_forecast).count(), 3);
    }

    #[test]
    fn test_forecast_needs_three_points() {
        let table = normalize(
            df!["date" => ["2023-01-01", "2023-01-02"], "units" => [1i64, 2]].unwrap(),
        );
        let err = forecast_column(&table, "units", "date", &ReportConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ComputationError::InsufficientData { needed: 3, found: 2, .. }
        ));
    }

    #[test]
    fn test_forecast_missing_column() {
        let table = normalize(df!["date" => ["2023-01-01"], "units" => [1i64]].unwrap());
        assert!(matches!(
            forecast_column(&table, "revenue", "date", &ReportConfig::default()),
            Err(ComputationError::ColumnNotFound(c)) if c == "revenue"
        ));
    }
}
