//! Declarative chart specifications.
//!
//! Charts are emitted in the Plotly figure layout (`{data: [...], layout:
//! {...}}`) so any Plotly-compatible front end can render them directly.
//! Nothing here draws; the builders only decide what goes in each trace.

pub mod correlation;
pub mod timeseries;

pub use correlation::{correlation_chart, correlation_matrix};
pub use timeseries::time_series_chart;

use crate::reporting::{ReportValue, ToReportValue};

/// Plotly's built-in light theme.
pub const TEMPLATE: &str = "plotly_white";

/// A complete figure.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    Scatter(ScatterTrace),
    Heatmap(HeatmapTrace),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterTrace {
    pub name: String,
    pub x: Vec<ReportValue>,
    pub y: Vec<ReportValue>,
    pub mode: &'static str,
    pub line: LineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: &'static str,
    pub width: u32,
    pub dash: Option<&'static str>,
}

/// A square matrix heat map. `NaN` cells render as gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapTrace {
    pub labels: Vec<String>,
    pub z: Vec<Vec<f64>>,
    pub colorscale: &'static str,
    pub zmin: f64,
    pub zmax: f64,
}

/// Figure layout. The flat axis titles are written out as Plotly's nested
/// `xaxis.title.text` / `yaxis.title.text`, the form `Figure.to_json()` emits.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub title: String,
    pub xaxis_title: String,
    pub yaxis_title: String,
    pub hovermode: Option<&'static str>,
    pub height: u32,
}

fn titled(text: &str) -> ReportValue {
    ReportValue::object([("text", ReportValue::from(text))])
}

impl ToReportValue for ScatterTrace {
    fn to_report_value(&self) -> ReportValue {
        let mut line = vec![
            ("color".to_string(), ReportValue::from(self.line.color)),
            ("width".to_string(), ReportValue::Int(i64::from(self.line.width))),
        ];
        if let Some(dash) = self.line.dash {
            line.push(("dash".to_string(), ReportValue::from(dash)));
        }

        ReportValue::object([
            ("type", ReportValue::from("scatter")),
            ("name", ReportValue::from(self.name.as_str())),
            ("x", ReportValue::Array(self.x.clone())),
            ("y", ReportValue::Array(self.y.clone())),
            ("mode", ReportValue::from(self.mode)),
            ("line", ReportValue::Object(line)),
        ])
    }
}

impl ToReportValue for HeatmapTrace {
    fn to_report_value(&self) -> ReportValue {
        let labels: Vec<ReportValue> = self
            .labels
            .iter()
            .map(|l| ReportValue::from(l.as_str()))
            .collect();
        let z = self
            .z
            .iter()
            .map(|row| ReportValue::FloatArray(row.clone()))
            .collect();

        ReportValue::object([
            ("type", ReportValue::from("heatmap")),
            ("z", ReportValue::Array(z)),
            ("x", ReportValue::Array(labels.clone())),
            ("y", ReportValue::Array(labels)),
            ("colorscale", ReportValue::from(self.colorscale)),
            ("zmin", ReportValue::Float(self.zmin)),
            ("zmax", ReportValue::Float(self.zmax)),
            ("hoverongaps", ReportValue::Bool(false)),
        ])
    }
}

impl ToReportValue for Trace {
    fn to_report_value(&self) -> ReportValue {
        match self {
            Trace::Scatter(trace) => trace.to_report_value(),
            Trace::Heatmap(trace) => trace.to_report_value(),
        }
    }
}

impl ToReportValue for Layout {
    fn to_report_value(&self) -> ReportValue {
        let mut entries = vec![
            ("title".to_string(), titled(&self.title)),
            (
                "xaxis".to_string(),
                ReportValue::object([("title", titled(&self.xaxis_title))]),
            ),
            (
                "yaxis".to_string(),
                ReportValue::object([("title", titled(&self.yaxis_title))]),
            ),
        ];
        if let Some(hovermode) = self.hovermode {
            entries.push(("hovermode".to_string(), ReportValue::from(hovermode)));
        }
        entries.push(("template".to_string(), ReportValue::from(TEMPLATE)));
        entries.push(("height".to_string(), ReportValue::Int(i64::from(self.height))));
        ReportValue::Object(entries)
    }
}

impl ToReportValue for ChartSpec {
    fn to_report_value(&self) -> ReportValue {
        ReportValue::object([
            ("data", self.data.to_report_value()),
            ("layout", self.layout.to_report_value()),
        ])
    }
}
