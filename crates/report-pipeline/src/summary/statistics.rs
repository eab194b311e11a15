//! Descriptive statistics for numeric columns.

use crate::types::ColumnStats;

/// Describe the non-missing values of a column.
///
/// Missing and non-finite cells are ignored. With no values every statistic
/// except `count` is `None`; with one value `std` is `None`.
pub(crate) fn describe(values: &[Option<f64>]) -> ColumnStats {
    let mut present: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    present.sort_by(f64::total_cmp);

    ColumnStats {
        count: present.len(),
        mean: mean(&present),
        std: sample_std(&present),
        min: present.first().copied(),
        q1: quantile(&present, 0.25),
        median: quantile(&present, 0.5),
        q3: quantile(&present, 0.75),
        max: present.last().copied(),
    }
}

/// Arithmetic mean.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// Population standard deviation (n denominator).
pub(crate) fn population_std(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Quantile of already sorted values, interpolating linearly between the two
/// nearest ranks.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let pos = q * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let fraction = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_describe_revenue() {
        let values = [Some(100.0), Some(150.0), Some(130.0), Some(200.0), Some(220.0)];
        let stats = describe(&values);

        assert_eq!(stats.count, 5);
        assert!((stats.mean.unwrap() - 160.0).abs() < EPS);
        assert!((stats.std.unwrap() - 49.497_474_683_058_33).abs() < 1e-9);
        assert_eq!(stats.min, Some(100.0));
        assert_eq!(stats.q1, Some(130.0));
        assert_eq!(stats.median, Some(150.0));
        assert_eq!(stats.q3, Some(200.0));
        assert_eq!(stats.max, Some(220.0));
    }

    #[test]
    fn test_describe_ignores_missing() {
        let stats = describe(&[Some(1.0), None, Some(3.0), Some(f64::NAN)]);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, Some(2.0));
    }

    #[test]
    fn test_describe_single_value_has_no_std() {
        let stats = describe(&[Some(5.0)]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.std, None);
        assert_eq!(stats.q1, Some(5.0));
    }

    #[test]
    fn test_describe_empty() {
        let stats = describe(&[None, None]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.max, None);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&sorted, 0.25).unwrap() - 1.75).abs() < EPS);
        assert!((quantile(&sorted, 0.5).unwrap() - 2.5).abs() < EPS);
        assert!((quantile(&sorted, 0.75).unwrap() - 3.25).abs() < EPS);
    }

    #[test]
    fn test_population_std() {
        assert_eq!(population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), Some(2.0));
        assert_eq!(population_std(&[]), None);
    }
}
