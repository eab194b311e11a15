//! Integration tests for the report pipeline.
//!
//! These tests drive the public API end to end over the CSV fixtures.

use pretty_assertions::assert_eq;
use report_pipeline::ai::InsightEnhancer;
use report_pipeline::{
    ReportConfig, ReportPipeline, ReportStage, ReportValue, StageStatus, sanitize,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(filename: &str) -> Vec<u8> {
    std::fs::read(fixtures_path().join(filename)).expect("Failed to read fixture")
}

fn generate(filename: &str) -> Value {
    generate_with(ReportPipeline::builder().build().unwrap(), filename)
}

fn generate_with(pipeline: ReportPipeline, filename: &str) -> Value {
    pipeline
        .generate(&read_fixture(filename), ".csv", "1")
        .expect("Report should be generated")
        .to_json_value()
        .expect("Artifact should serialize")
}

fn keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .map(|o| o.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

struct FailingEnhancer;

impl InsightEnhancer for FailingEnhancer {
    fn enhance(&self, _insights: &str) -> anyhow::Result<String> {
        anyhow::bail!("503 Service Unavailable")
    }

    fn name(&self) -> &str {
        "Failing"
    }
}

// ============================================================================
// Sales Scenario
// ============================================================================

#[test]
fn test_sales_scenario() {
    let artifact = generate("sales.csv");

    assert_eq!(
        keys(&artifact),
        vec!["summary_stats", "ai_analysis", "visualizations"]
    );

    let summary = &artifact["summary_stats"];
    assert_eq!(summary["row_count"], json!(5));
    assert_eq!(summary["columns"], json!(["date", "revenue", "expenses"]));
    assert_eq!(keys(&summary["numeric_stats"]), vec!["revenue", "expenses"]);
    assert_eq!(summary["numeric_stats"]["revenue"]["count"], json!(5));
    assert_eq!(summary["numeric_stats"]["revenue"]["mean"], json!(170.0));
    assert_eq!(summary["numeric_stats"]["revenue"]["min"], json!(100.0));
    assert_eq!(summary["numeric_stats"]["revenue"]["max"], json!(220.0));
    assert!(summary.get("narrative").is_none());

    // No anomalies under 10 rows, no forecasts at or under 10 rows
    assert!(keys(&artifact["ai_analysis"]).is_empty());

    assert_eq!(
        keys(&artifact["visualizations"]),
        vec!["revenue_trend", "correlation_matrix"]
    );
}

#[test]
fn test_sales_insights() {
    let artifact = generate("sales.csv");
    let insights = artifact["summary_stats"]["insights"].as_array().unwrap();
    assert_eq!(insights.len(), 4);

    assert_eq!(
        insights[0]["summary"],
        json!(
            "The revenue has an average of 170.0 (range: 100.0 to 220.0). \
             Most values fall between 150.0 and 200.0."
        )
    );

    let revenue_trend = &insights[2];
    assert_eq!(revenue_trend["metric"], json!("revenue"));
    assert_eq!(revenue_trend["trend"]["direction"], json!("increased"));
    assert_eq!(revenue_trend["trend"]["amount"], json!(120.0));
    assert_eq!(revenue_trend["trend"]["pct_change"], json!(120.0));
    assert_eq!(
        revenue_trend["trend"]["period"],
        json!("2023-01-01 to 2023-01-05")
    );
    assert_eq!(
        revenue_trend["summary"],
        json!("Over 4 days, revenue increased by 120.00 (120.00%).")
    );
}

#[test]
fn test_sales_charts() {
    let artifact = generate("sales.csv");

    let trend = &artifact["visualizations"]["revenue_trend"];
    assert_eq!(trend["layout"]["title"]["text"], json!("Revenue Trend"));
    let traces = trend["data"].as_array().unwrap();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0]["y"], json!([100, 150, 200, 180, 220]));
    assert_eq!(traces[0]["x"][0], json!("2023-01-01T00:00:00"));

    let heatmap = &artifact["visualizations"]["correlation_matrix"]["data"][0];
    assert_eq!(heatmap["type"], json!("heatmap"));
    assert_eq!(heatmap["x"], json!(["revenue", "expenses"]));
    let self_correlation = heatmap["z"][0][0].as_f64().unwrap();
    assert!((self_correlation - 1.0).abs() < 1e-12);
}

// ============================================================================
// Anomalies and Forecasts
// ============================================================================

#[test]
fn test_spike_is_flagged_as_anomaly() {
    let artifact = generate("metrics_with_spike.csv");

    let anomalies = artifact["ai_analysis"]["anomalies"].as_array().unwrap();
    // floor(0.05 * 40)
    assert_eq!(anomalies.len(), 2);
    assert!(anomalies.iter().any(|a| a["revenue"] == json!(5000)));
    for record in anomalies {
        assert_eq!(keys(record), vec!["revenue", "units"]);
    }
}

#[test]
fn test_anomalies_are_deterministic() {
    let first = generate("metrics_with_spike.csv");
    let second = generate("metrics_with_spike.csv");
    assert_eq!(
        first["ai_analysis"]["anomalies"],
        second["ai_analysis"]["anomalies"]
    );
}

#[test]
fn test_linear_forecast_accuracy() {
    let artifact = generate("linear_daily.csv");
    let forecast = artifact["ai_analysis"]["revenue_forecast"].as_array().unwrap();
    assert_eq!(forecast.len(), 15 + 3);

    let history = &forecast[14];
    assert_eq!(history["date"], json!("2023-03-15T00:00:00"));
    assert_eq!(history["value"], json!(340));
    assert_eq!(history["is_forecast"], json!(false));

    let expected = [
        ("2023-03-16T00:00:00", 350.0),
        ("2023-03-17T00:00:00", 360.0),
        ("2023-03-18T00:00:00", 370.0),
    ];
    for (point, (date, value)) in forecast[15..].iter().zip(expected) {
        assert_eq!(point["date"], json!(date));
        assert_eq!(point["is_forecast"], json!(true));
        let predicted = point["value"].as_f64().unwrap();
        assert!(
            (predicted - value).abs() < 1e-6,
            "expected {} on {}, got {}",
            value,
            date,
            predicted
        );
    }
}

#[test]
fn test_forecast_keys_follow_numeric_columns() {
    let artifact = generate("linear_daily.csv");
    assert_eq!(
        keys(&artifact["ai_analysis"]),
        vec!["revenue_forecast", "expenses_forecast", "headcount_forecast"]
    );

    let chart = &artifact["visualizations"]["revenue_trend"]["data"];
    assert_eq!(chart[0]["name"], json!("Actual"));
    assert_eq!(chart[1]["name"], json!("Forecast"));
    assert_eq!(chart[1]["line"]["dash"], json!("dot"));
}

#[test]
fn test_forecast_threshold_is_strict() {
    // 10 rows: no forecast
    let text: String = std::iter::once("date,revenue\n".to_string())
        .chain((1..=10).map(|d| format!("2023-01-{:02},{}\n", d, d * 10)))
        .collect();
    let report = ReportPipeline::builder()
        .build()
        .unwrap()
        .generate(text.as_bytes(), ".csv", "1")
        .unwrap();
    let artifact = report.to_json_value().unwrap();
    assert!(artifact["ai_analysis"].get("revenue_forecast").is_none());

    // 11 rows: forecast
    let text = format!("{}2023-01-11,110\n", text);
    let report = ReportPipeline::builder()
        .build()
        .unwrap()
        .generate(text.as_bytes(), ".csv", "1")
        .unwrap();
    let artifact = report.to_json_value().unwrap();
    assert!(artifact["ai_analysis"].get("revenue_forecast").is_some());
}

// ============================================================================
// Insights
// ============================================================================

#[test]
fn test_flat_column_has_no_insights() {
    let artifact = generate("linear_daily.csv");
    let summary = &artifact["summary_stats"];

    assert_eq!(summary["numeric_stats"]["headcount"]["std"], json!(0.0));
    let metrics: Vec<&str> = summary["insights"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["metric"].as_str())
        .collect();
    assert!(!metrics.contains(&"headcount"));
    assert!(metrics.contains(&"revenue"));
}

#[test]
fn test_mixed_types_are_normalized() {
    let artifact = generate("mixed_types.csv");
    let summary = &artifact["summary_stats"];

    assert_eq!(keys(&summary["numeric_stats"]), vec!["revenue", "discount"]);
    assert_eq!(summary["numeric_stats"]["discount"]["count"], json!(4));
    assert_eq!(summary["numeric_stats"]["revenue"]["count"], json!(5));
    assert_eq!(
        keys(&artifact["visualizations"]),
        vec!["revenue_trend", "correlation_matrix"]
    );
}

// ============================================================================
// Enhancement
// ============================================================================

#[test]
fn test_enhancer_failure_degrades_only_narrative() {
    let pipeline = ReportPipeline::builder()
        .enhancer(Arc::new(FailingEnhancer))
        .build()
        .unwrap();
    let report = pipeline
        .generate(&read_fixture("sales.csv"), ".csv", "9")
        .unwrap();

    let enhancement = report
        .stages
        .iter()
        .find(|s| s.stage == ReportStage::Enhancement)
        .unwrap();
    assert_eq!(enhancement.status, StageStatus::Degraded);
    assert_eq!(enhancement.error_code.as_deref(), Some("ENHANCEMENT_FAILED"));

    let artifact = report.to_json_value().unwrap();
    assert!(artifact["summary_stats"].get("narrative").is_none());
    assert_eq!(artifact["summary_stats"]["insights"].as_array().unwrap().len(), 4);
}

// ============================================================================
// Chart Presence
// ============================================================================

#[test]
fn test_charts_need_date_and_value_columns() {
    let config = ReportConfig::builder()
        .trend_value_column("profit")
        .build()
        .unwrap();
    let pipeline = ReportPipeline::builder().config(config).build().unwrap();
    let artifact = generate_with(pipeline, "sales.csv");
    assert_eq!(keys(&artifact["visualizations"]), vec!["correlation_matrix"]);

    let report = ReportPipeline::builder()
        .build()
        .unwrap()
        .generate(b"revenue,region\n10,north\n20,south\n", ".csv", "1")
        .unwrap();
    let artifact = report.to_json_value().unwrap();
    assert!(keys(&artifact["visualizations"]).is_empty());
}

#[test]
fn test_custom_value_column_chart() {
    let config = ReportConfig::builder()
        .trend_value_column("expenses")
        .build()
        .unwrap();
    let pipeline = ReportPipeline::builder().config(config).build().unwrap();
    let artifact = generate_with(pipeline, "sales.csv");
    assert_eq!(
        artifact["visualizations"]["expenses_trend"]["layout"]["title"]["text"],
        json!("Expenses Trend")
    );
}

#[test]
fn test_numeric_day_column_is_plotted() {
    let text: String = std::iter::once("day,revenue\n".to_string())
        .chain((1..=15).map(|d| format!("{},{}\n", d, 100 + 10 * d)))
        .collect();
    let report = ReportPipeline::builder()
        .build()
        .unwrap()
        .generate(text.as_bytes(), ".csv", "1")
        .unwrap();
    assert_eq!(report.degraded_stages().count(), 0);

    let artifact = report.to_json_value().unwrap();
    assert_eq!(
        keys(&artifact["visualizations"]),
        vec!["revenue_trend", "correlation_matrix"]
    );
    let trace = &artifact["visualizations"]["revenue_trend"]["data"][0];
    assert_eq!(trace["x"][0], json!(1));
    assert_eq!(trace["x"][14], json!(15));
    assert_eq!(trace["y"][14], json!(250));
    assert_eq!(
        artifact["visualizations"]["revenue_trend"]["layout"]["xaxis"]["title"]["text"],
        json!("day")
    );

    // A day counter is not a calendar, so there is nothing to project.
    assert!(keys(&artifact["ai_analysis"]).is_empty());
}

// ============================================================================
// Failure Handling
// ============================================================================

#[test]
fn test_malformed_csv_is_fatal() {
    let pipeline = ReportPipeline::builder().build().unwrap();

    let err = pipeline
        .generate(b"\x00\xFF\xFE\xFD binary", ".csv", "1")
        .unwrap_err();
    assert!(err.is_ingestion());
    assert_eq!(err.error_code(), "INVALID_ENCODING");

    let err = pipeline.generate(b"", ".csv", "1").unwrap_err();
    assert!(err.is_ingestion());
}

#[test]
fn test_unsupported_extension_is_fatal() {
    let pipeline = ReportPipeline::builder().build().unwrap();
    let err = pipeline
        .generate(&read_fixture("sales.csv"), ".pdf", "1")
        .unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_EXTENSION");
}

#[test]
fn test_garbage_xlsx_is_fatal() {
    let pipeline = ReportPipeline::builder().build().unwrap();
    let err = pipeline
        .generate(b"definitely not a zip archive", ".xlsx", "1")
        .unwrap_err();
    assert!(err.is_ingestion());
}

// ============================================================================
// Sanitizer
// ============================================================================

#[test]
fn test_artifact_sanitize_is_idempotent() {
    let report = ReportPipeline::builder()
        .build()
        .unwrap()
        .generate(&read_fixture("metrics_with_spike.csv"), ".csv", "1")
        .unwrap();

    let once: ReportValue = report.artifact.clone();
    let twice = sanitize(once.clone()).unwrap();
    assert_eq!(once, twice);
    assert!(twice.is_sanitized());
}
