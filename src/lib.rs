// Library exports for surveyplot

pub mod csv_reader;
pub mod data;
pub mod error;
pub mod graph;
pub mod logging;
pub mod schema;

// Analysis pipeline
pub mod classify;
pub mod coerce;
pub mod ir;
pub mod multiselect;
pub mod multivariate;
pub mod session;
pub mod stats;
pub mod univariate;

pub use classify::{classify, VariableKind};
pub use coerce::{coerce, CoercedColumn, CoercedDataset};
pub use error::{AnalysisError, LoadError, SchemaError, Severity};
pub use ir::{ChartSpec, ChartView, Geometry};
pub use multivariate::multivariate_chart;
pub use schema::{ColumnKind, ColumnSpec, SurveySchema};
pub use session::{Selectors, Session, UploadStatus};
pub use univariate::univariate_chart;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}
