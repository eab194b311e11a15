use super::{ChartSpec, HeatmapTrace, Layout, Trace};
use crate::error::ComputationError;
use crate::pipeline::StageOutcome;
use crate::types::Table;
use polars::prelude::cov::pearson_corr;
use polars::prelude::*;

/// Pearson correlation over the rows where both values are present and
/// finite.
///
/// Returns `NaN` with fewer than two complete pairs or when either side has
/// no variance. Results are clamped to `[-1, 1]`.
pub fn pearson(a: &Float64Chunked, b: &Float64Chunked) -> Result<f64, ComputationError> {
    let complete = (a.is_finite() & b.is_finite()).fill_null_with_values(false)?;
    let (a, b) = (a.filter(&complete)?, b.filter(&complete)?);
    Ok(pearson_corr(&a, &b).map_or(f64::NAN, |r| r.clamp(-1.0, 1.0)))
}

/// Pairwise correlation matrix of the numeric columns, in file order.
pub fn correlation_matrix(table: &Table) -> Result<(Vec<String>, Vec<Vec<f64>>), ComputationError> {
    let columns = table.numeric_columns();
    let values = columns
        .iter()
        .map(|c| table.float_column(c))
        .collect::<Result<Vec<_>, _>>()?;

    let z = values
        .iter()
        .map(|a| values.iter().map(|b| pearson(a, b)).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<Vec<f64>>, _>>()?;
    Ok((columns.into_iter().map(str::to_string).collect(), z))
}

/// Heat map of the correlation matrix. Skipped with fewer than two numeric
/// columns.
pub fn correlation_chart(table: &Table) -> StageOutcome<ChartSpec> {
    let numeric = table.numeric_columns().len();
    if numeric < 2 {
        return StageOutcome::Skipped(format!("need 2 numeric columns, found {}", numeric));
    }

    correlation_matrix(table)
        .map(|(labels, z)| ChartSpec {
            data: vec![Trace::Heatmap(HeatmapTrace {
                labels,
                z,
                colorscale: "RdBu",
                zmin: -1.0,
                zmax: 1.0,
            })],
            layout: Layout {
                title: "Feature Correlation Matrix".to_string(),
                xaxis_title: "Features".to_string(),
                yaxis_title: "Features".to_string(),
                hovermode: None,
                height: 600,
            },
        })
        .into()
}
