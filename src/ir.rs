use serde::Serialize;

use crate::error::Severity;

// =============================================================================
// Chart Spec
// =============================================================================

/// Renderer-agnostic description of one chart.
///
/// The selection policies fill this in; `graph` (or any other renderer) draws
/// it. Layout concerns such as title placement are left to the renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartSpec {
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    /// Title of the colour legend for grouped presentations.
    pub legend_title: Option<String>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    #[default]
    Empty,
    Histogram {
        bins: Vec<HistogramBin>,
    },
    /// Bars in display order.
    Bar {
        bars: Vec<Bar>,
    },
    Scatter {
        points: Vec<(f64, f64)>,
        trend: Option<TrendLine>,
    },
    BoxPlot {
        groups: Vec<BoxGroup>,
    },
    /// Side-by-side bars: one series per colour group, each aligned with
    /// `categories`.
    GroupedBar {
        categories: Vec<String>,
        series: Vec<BarSeries>,
    },
}

impl Geometry {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Geometry::Empty => "empty",
            Geometry::Histogram { .. } => "histogram",
            Geometry::Bar { .. } => "bar",
            Geometry::Scatter { .. } => "scatter",
            Geometry::BoxPlot { .. } => "box_plot",
            Geometry::GroupedBar { .. } => "grouped_bar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Observed x range the line is drawn over.
    pub x_min: f64,
    pub x_max: f64,
}

impl TrendLine {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGroup {
    pub category: String,
    pub summary: BoxSummary,
    /// Every observation in the group, overlaid on the box.
    pub points: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarSeries {
    pub key: String,
    pub counts: Vec<usize>,
}

impl ChartSpec {
    /// The blank figure shown when nothing can be plotted.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.geometry, Geometry::Empty)
    }
}

// =============================================================================
// Chart View
// =============================================================================

/// What a chart request hands back to the caller: a chart and a status line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub chart: ChartSpec,
    pub message: String,
    pub severity: Severity,
}

impl ChartView {
    pub fn new(chart: ChartSpec, message: impl Into<String>) -> Self {
        Self {
            chart,
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn blank(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            chart: ChartSpec::empty(),
            message: message.into(),
            severity,
        }
    }
}
