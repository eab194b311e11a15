//! CLI entry point for the report pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use report_pipeline::{
    FileFormat, GeneratedReport, ReportConfig, ReportPipeline, ReportValue, StageStatus,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[cfg(feature = "ai")]
use report_pipeline::ai::{HuggingFaceEnhancer, InsightEnhancer};
#[cfg(feature = "ai")]
use std::env;
#[cfg(feature = "ai")]
use std::sync::Arc;
#[cfg(feature = "ai")]
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Tabular report generator",
    long_about = "Builds an analytical report (statistics, insights, anomalies, forecasts \
                  and chart specs) from a CSV or Excel file.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  HUGGINGFACE_API_TOKEN    Token for the narrative summary (optional)\n\n\
                  EXAMPLES:\n  \
                  # Human-readable summary\n  \
                  report-pipeline -i sales.csv\n\n  \
                  # Pipe the artifact to another tool\n  \
                  report-pipeline -i sales.xlsx --json | jq .ai_analysis\n\n  \
                  # Chart a different column and save the artifact\n  \
                  report-pipeline -i sales.csv --value-column units -o out/report.json"
)]
struct Args {
    /// Path to the CSV, XLS or XLSX file
    #[arg(short, long)]
    input: PathBuf,

    /// Template identifier passed through to the report
    #[arg(long, default_value = "1")]
    template: String,

    /// Column plotted by the time-series chart
    #[arg(long, default_value = "revenue")]
    value_column: String,

    /// Skip the narrative summary
    #[arg(long, default_value = "false")]
    no_ai: bool,

    /// Print the artifact JSON to stdout instead of a summary
    ///
    /// Disables all logs; only the artifact is written.
    #[arg(long)]
    json: bool,

    /// Write the artifact JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }
    let format = FileFormat::from_path(&args.input)?;

    info!("Loading {} file: {}", format.as_str(), args.input.display());
    let bytes = std::fs::read(&args.input)?;

    let config = ReportConfig::builder()
        .trend_value_column(&args.value_column)
        .enhance_insights(!args.no_ai)
        .build()?;
    let pipeline = build_pipeline(&args, config)?;

    let report = match pipeline.generate(&bytes, format.as_str(), &args.template) {
        Ok(report) => report,
        Err(e) => {
            error!("Report failed: {}", e);
            return Err(anyhow!("Report failed [{}]: {}", e.error_code(), e));
        }
    };

    if let Some(ref path) = args.output {
        report.write_json(path)?;
    }

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    print_human_readable_summary(&report, &args.input);
    Ok(())
}

/// Build the pipeline, installing the enhancer when a token is available.
#[cfg(feature = "ai")]
fn build_pipeline(args: &Args, config: ReportConfig) -> Result<ReportPipeline> {
    if args.no_ai {
        info!("Narrative summary disabled");
        return Ok(ReportPipeline::builder().config(config).build()?);
    }

    let token = match env::var("HUGGINGFACE_API_TOKEN") {
        Ok(token) if !token.trim().is_empty() => token,
        _ => {
            warn!("HUGGINGFACE_API_TOKEN not set. Skipping the narrative summary.");
            return Ok(ReportPipeline::builder().config(config).build()?);
        }
    };

    let enhancer = Arc::new(HuggingFaceEnhancer::new(token)?);
    info!(
        "Narrative summary via {} ({})",
        enhancer.name(),
        enhancer.model().unwrap_or("default")
    );

    Ok(ReportPipeline::builder()
        .config(config)
        .enhancer(enhancer)
        .build()?)
}

/// Build the pipeline without enhancement (fallback when "ai" feature is disabled)
#[cfg(not(feature = "ai"))]
fn build_pipeline(args: &Args, config: ReportConfig) -> Result<ReportPipeline> {
    if !args.no_ai {
        tracing::warn!("AI support not compiled in. Skipping the narrative summary.");
    }
    Ok(ReportPipeline::builder().config(config).build()?)
}

/// Print a human-readable summary of the report.
///
/// Uses `println!` on purpose: this is the command's output, not a log line.
fn print_human_readable_summary(report: &GeneratedReport, input: &Path) {
    let artifact = &report.artifact;

    println!();
    println!("{}", "=".repeat(80));
    println!("REPORT COMPLETE (template {})", report.template_id);
    println!("{}", "=".repeat(80));
    println!();

    let rows = artifact
        .pointer(&["summary_stats", "row_count"])
        .and_then(ReportValue::as_i64)
        .unwrap_or(0);
    let columns = artifact
        .pointer(&["summary_stats", "columns"])
        .and_then(ReportValue::as_array)
        .map(<[ReportValue]>::len)
        .unwrap_or(0);
    println!("Input: {} ({} rows x {} columns)", input.display(), rows, columns);
    println!();

    if let Some(insights) = artifact
        .pointer(&["summary_stats", "insights"])
        .and_then(ReportValue::as_array)
        .filter(|i| !i.is_empty())
    {
        println!("Insights:");
        for insight in insights {
            if let Some(summary) = insight.get("summary").and_then(ReportValue::as_str) {
                println!("  - {}", summary);
            }
        }
        println!();
    }

    if let Some(narrative) = artifact
        .pointer(&["summary_stats", "narrative"])
        .and_then(ReportValue::as_str)
    {
        println!("Narrative:");
        for line in narrative.lines().filter(|l| !l.trim().is_empty()) {
            println!("  {}", line.trim());
        }
        println!();
    }

    if let Some(analysis) = artifact.get("ai_analysis") {
        let anomalies = analysis
            .get("anomalies")
            .and_then(ReportValue::as_array)
            .map(<[ReportValue]>::len)
            .unwrap_or(0);
        println!("Anomalous rows: {}", anomalies);
        let forecasts: Vec<&str> = analysis
            .keys()
            .into_iter()
            .filter_map(|k| k.strip_suffix("_forecast"))
            .collect();
        if !forecasts.is_empty() {
            println!("Forecasts: {}", forecasts.join(", "));
        }
    }
    if let Some(charts) = artifact.get("visualizations") {
        let charts = charts.keys();
        if !charts.is_empty() {
            println!("Charts: {}", charts.join(", "));
        }
    }
    println!();

    let degraded: Vec<_> = report
        .stages
        .iter()
        .filter(|s| s.status == StageStatus::Degraded)
        .collect();
    if !degraded.is_empty() {
        println!("Degraded stages:");
        for stage in degraded {
            println!(
                "  ! {}{}: {}",
                stage.stage.display_name(),
                stage
                    .target
                    .as_deref()
                    .map(|t| format!(" ({})", t))
                    .unwrap_or_default(),
                stage.detail.as_deref().unwrap_or("")
            );
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
