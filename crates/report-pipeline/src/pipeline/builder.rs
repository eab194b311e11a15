//! Main report pipeline module.
//!
//! This module provides the [`ReportPipeline`] struct and its builder, which
//! run every stage over one upload and hand back the finished artifact.

use crate::ai::InsightEnhancer;
use crate::analysis::{detect_anomalies, forecast_all};
use crate::charts::{correlation_chart, time_series_chart};
use crate::config::{ConfigValidationError, ReportConfig};
use crate::error::{ResultExt, Result};
use crate::loader::load_table;
use crate::normalizer::normalize;
use crate::pipeline::outcome::{ReportStage, StageOutcome, StageRecord, StageStatus};
use crate::reporting::{ReportParts, ReportValue, assemble, sanitize};
use crate::summary::{enhance, summarize};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The report generation pipeline.
///
/// Use [`ReportPipeline::builder()`] to create a pipeline with custom
/// configuration. A built pipeline holds no per-run state and can generate
/// any number of reports.
///
/// # Example
///
/// ```rust,ignore
/// use report_pipeline::{ReportConfig, ReportPipeline};
/// use report_pipeline::ai::HuggingFaceEnhancer;
/// use std::sync::Arc;
///
/// // With narrative enhancement
/// let enhancer = Arc::new(HuggingFaceEnhancer::new(token)?);
/// let report = ReportPipeline::builder()
///     .enhancer(enhancer)
///     .build()?
///     .generate(&bytes, ".csv", "1")?;
///
/// // Structured insights only, charting a different column
/// let report = ReportPipeline::builder()
///     .config(ReportConfig::builder().trend_value_column("sales").build()?)
///     .build()?
///     .generate(&bytes, ".xlsx", "7")?;
/// ```
pub struct ReportPipeline {
    config: ReportConfig,
    enhancer: Option<Arc<dyn InsightEnhancer>>,
}

// Callers run invocations on their own worker threads.
static_assertions::assert_impl_all!(ReportPipeline: Send, Sync);

/// The result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReport {
    /// Opaque identifier supplied by the caller, passed through untouched.
    pub template_id: String,
    /// The sanitized report artifact.
    pub artifact: ReportValue,
    /// What happened in each stage, in execution order.
    pub stages: Vec<StageRecord>,
}

impl GeneratedReport {
    /// The artifact as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.artifact)
    }

    /// The artifact as a `serde_json` value.
    pub fn to_json_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(&self.artifact)
    }

    /// Stages that failed and left their artifact key out.
    pub fn degraded_stages(&self) -> impl Iterator<Item = &StageRecord> {
        self.stages
            .iter()
            .filter(|r| r.status == StageStatus::Degraded)
    }

    /// Write the artifact JSON to `path`, creating parent directories.
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        info!("Report saved: {}", path.display());
        Ok(())
    }
}

impl ReportPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> ReportPipelineBuilder {
        ReportPipelineBuilder::default()
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Generate a report from the raw bytes of an upload.
    ///
    /// `extension` selects the parser (`.csv`, `.xls`, `.xlsx`).
    ///
    /// # Errors
    ///
    /// Only fatal failures are returned: [`crate::ReportError::Ingestion`]
    /// when the file cannot be loaded and [`crate::ReportError::Contract`]
    /// when the artifact cannot be made JSON-safe. Failures in optional
    /// stages are recorded in [`GeneratedReport::stages`] instead.
    pub fn generate(
        &self,
        bytes: &[u8],
        extension: &str,
        template_id: impl Into<String>,
    ) -> Result<GeneratedReport> {
        let template_id = template_id.into();
        match self.generate_internal(bytes, extension, &template_id) {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("Report generation failed [{}]: {}", e.error_code(), e);
                Err(e)
            }
        }
    }

    fn generate_internal(
        &self,
        bytes: &[u8],
        extension: &str,
        template_id: &str,
    ) -> Result<GeneratedReport> {
        let start_time = Instant::now();
        info!("Generating report for template {}", template_id);
        let mut stages = Vec::new();

        // Step 1: Load
        let frame = load_table(bytes, extension).context("Loading upload")?;
        stages.push(StageRecord::completed(ReportStage::Loading));

        // Step 2: Normalize
        let table = normalize(frame);
        stages.push(StageRecord::completed(ReportStage::Normalization));

        // Step 3: Summaries and insights
        let summary = summarize(&table);
        stages.push(StageRecord::completed(ReportStage::Summary));
        stages.push(summary.trend.record(ReportStage::TrendInsights, None));

        let narrative = match &self.enhancer {
            Some(enhancer) if self.config.enhance_insights => enhance(&summary, enhancer.as_ref()),
            Some(_) => StageOutcome::Skipped("enhancement disabled".to_string()),
            None => StageOutcome::Skipped("no enhancer configured".to_string()),
        };
        stages.push(narrative.record(ReportStage::Enhancement, None));

        // Step 4: Anomalies
        let anomalies = detect_anomalies(&table, &self.config);
        stages.push(anomalies.record(ReportStage::AnomalyDetection, None));

        // Step 5: Forecasts
        let forecasts = forecast_all(&table, &self.config);
        for (column, outcome) in &forecasts {
            stages.push(outcome.record(ReportStage::Forecast, Some(column.as_str())));
        }
        let value_forecast = forecasts
            .iter()
            .find(|(column, _)| *column == self.config.trend_value_column)
            .and_then(|(_, outcome)| outcome.as_computed())
            .map(Vec::as_slice);

        // Step 6: Charts
        let time_series = time_series_chart(&table, &self.config, value_forecast);
        stages.push(time_series.record(
            ReportStage::TimeSeriesChart,
            Some(self.config.trend_value_column.as_str()),
        ));
        let correlation = correlation_chart(&table);
        stages.push(correlation.record(ReportStage::CorrelationChart, None));

        for record in stages.iter().filter(|r| r.status == StageStatus::Degraded) {
            warn!(
                "{} degraded{}: {}",
                record.stage.display_name(),
                record
                    .target
                    .as_deref()
                    .map(|t| format!(" for '{}'", t))
                    .unwrap_or_default(),
                record.detail.as_deref().unwrap_or("")
            );
        }

        // Step 7: Assemble and sanitize
        let artifact = assemble(&ReportParts {
            table: &table,
            summary: &summary,
            narrative: narrative.as_computed().map(String::as_str),
            anomalies: anomalies.as_computed().map(Vec::as_slice),
            forecasts: forecasts
                .iter()
                .filter_map(|(column, outcome)| {
                    outcome.as_computed().map(|p| (column.as_str(), p.as_slice()))
                })
                .collect(),
            value_column: &self.config.trend_value_column,
            time_series: time_series.as_computed(),
            correlation: correlation.as_computed(),
        });
        let artifact = sanitize(artifact).context("Sanitizing report")?;
        stages.push(StageRecord::completed(ReportStage::Assembly));

        info!(
            "Report for template {} generated in {} ms",
            template_id,
            start_time.elapsed().as_millis()
        );

        Ok(GeneratedReport {
            template_id: template_id.to_string(),
            artifact,
            stages,
        })
    }
}

/// Builder for [`ReportPipeline`].
#[derive(Default)]
pub struct ReportPipelineBuilder {
    config: Option<ReportConfig>,
    enhancer: Option<Arc<dyn InsightEnhancer>>,
}

static_assertions::assert_impl_all!(ReportPipelineBuilder: Send);

impl ReportPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: ReportConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Install a narrative enhancer.
    ///
    /// Use `Arc` to share one enhancer (and its HTTP client) across
    /// pipelines. Without an enhancer the artifact carries structured
    /// insights only.
    pub fn enhancer(mut self, enhancer: Arc<dyn InsightEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<ReportPipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(ReportPipeline {
            config,
            enhancer: self.enhancer,
        })
    }
}
