//! One user's dashboard state.
//!
//! A session is either empty or holds exactly one coerced dataset. Every
//! request is answered synchronously from that dataset; uploads replace it
//! wholesale and a failed upload clears it.

use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};

use crate::coerce::{coerce, CoercedDataset};
use crate::csv_reader::read_csv_bytes;
use crate::error::{AnalysisError, LoadError, Severity};
use crate::ir::ChartView;
use crate::multivariate::multivariate_chart;
use crate::schema::SurveySchema;
use crate::univariate::univariate_chart;

/// Result of an upload as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadStatus {
    pub message: String,
    pub severity: Severity,
    pub rows: Option<usize>,
}

/// Column choices offered to the user, plus defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selectors {
    pub univariate: Vec<String>,
    pub multivariate: Vec<String>,
    pub default_univariate: Option<String>,
    pub default_first: Option<String>,
    pub default_second: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
struct Loaded {
    filename: String,
    data: CoercedDataset,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    schema: SurveySchema,
    loaded: Option<Loaded>,
}

impl Session {
    pub fn new(schema: SurveySchema) -> Self {
        Self { schema, loaded: None }
    }

    pub fn schema(&self) -> &SurveySchema {
        &self.schema
    }

    pub fn dataset(&self) -> Option<&CoercedDataset> {
        self.loaded.as_ref().map(|l| &l.data)
    }

    pub fn filename(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.filename.as_str())
    }

    /// Parse and store an uploaded file, replacing whatever was loaded.
    pub fn upload(&mut self, filename: &str, bytes: &[u8]) -> UploadStatus {
        self.loaded = None;

        match self.load(filename, bytes) {
            Ok(data) => {
                let rows = data.row_count;
                tracing::info!(filename, rows, columns = data.columns.len(), "dataset loaded");
                self.loaded = Some(Loaded {
                    filename: filename.to_string(),
                    data,
                });
                UploadStatus {
                    message: format!("Processing '{filename}' ({rows} rows)..."),
                    severity: Severity::Info,
                    rows: Some(rows),
                }
            }
            Err(LoadError::InvalidFileType { .. }) => {
                tracing::warn!(filename, "rejected upload with non-CSV name");
                UploadStatus {
                    message: "Invalid file type. Please upload a CSV file.".to_string(),
                    severity: Severity::Warning,
                    rows: None,
                }
            }
            Err(err) => {
                tracing::warn!(filename, error = %err, "failed to process upload");
                UploadStatus {
                    message: format!(
                        "Error processing file: {err}. Ensure valid CSV (UTF-8 recommended)."
                    ),
                    severity: Severity::Warning,
                    rows: None,
                }
            }
        }
    }

    fn load(&self, filename: &str, bytes: &[u8]) -> Result<CoercedDataset, LoadError> {
        if !filename.to_lowercase().contains("csv") {
            return Err(LoadError::InvalidFileType {
                filename: filename.to_string(),
            });
        }
        let dataset = read_csv_bytes(bytes)?;
        Ok(coerce(&dataset, &self.schema))
    }

    /// The upload widget was cleared.
    pub fn clear(&mut self) -> UploadStatus {
        self.loaded = None;
        UploadStatus {
            message: "Upload component cleared.".to_string(),
            severity: Severity::Info,
            rows: None,
        }
    }

    /// Columns the user may pick, limited to schema columns in the file.
    pub fn selectors(&self) -> Selectors {
        let Some(data) = self.dataset() else {
            return Selectors {
                message: "Upload data to populate dropdowns.".to_string(),
                ..Selectors::default()
            };
        };
        if data.is_empty() {
            return Selectors {
                message: "Uploaded CSV is empty.".to_string(),
                ..Selectors::default()
            };
        }

        let univariate: Vec<String> = self
            .schema
            .univariate_columns()
            .filter(|c| data.contains(c))
            .map(str::to_string)
            .collect();
        let multivariate: Vec<String> = self
            .schema
            .multivariate_columns()
            .filter(|c| data.contains(c))
            .map(str::to_string)
            .collect();

        Selectors {
            default_univariate: univariate.first().cloned(),
            default_first: multivariate.first().cloned(),
            default_second: multivariate.get(1).cloned(),
            univariate,
            multivariate,
            message: format!(
                "Data loaded ({} responses). Select variables below for analysis.",
                data.row_count
            ),
        }
    }

    /// Chart one column. Never fails; problems become the view's message.
    pub fn univariate(&self, column: Option<&str>) -> ChartView {
        guarded(|| {
            let column = column
                .filter(|c| !c.is_empty())
                .ok_or(AnalysisError::NoSelection { needed: 1 })?;
            let data = self.dataset().ok_or(AnalysisError::NoDataset)?;
            univariate_chart(data, &self.schema, column)
        })
    }

    /// Chart two columns against each other. Never fails.
    pub fn multivariate(&self, first: Option<&str>, second: Option<&str>) -> ChartView {
        guarded(|| {
            let first = first.filter(|c| !c.is_empty());
            let second = second.filter(|c| !c.is_empty());
            let (Some(first), Some(second)) = (first, second) else {
                return Err(AnalysisError::NoSelection { needed: 2 });
            };
            let data = self.dataset().ok_or(AnalysisError::NoDataset)?;
            multivariate_chart(data, &self.schema, first, second)
        })
    }
}

/// Run one chart request, turning named errors and unexpected panics into a
/// blank chart with a message.
fn guarded<F>(build: F) -> ChartView
where
    F: FnOnce() -> Result<ChartView, AnalysisError>,
{
    match panic::catch_unwind(AssertUnwindSafe(build)) {
        Ok(Ok(view)) => view,
        Ok(Err(err)) => {
            tracing::debug!(error = %err, "no chart for selection");
            ChartView::blank(err.to_string(), err.severity())
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unexpected failure".to_string());
            tracing::error!(%reason, "chart construction panicked");
            ChartView::blank(format!("Plotting error: {reason}"), Severity::Warning)
        }
    }
}
