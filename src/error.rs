//! Error types for loading survey files and building charts.

use std::path::PathBuf;
use thiserror::Error;

use crate::classify::VariableKind;

/// Errors raised while turning an uploaded file into a dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The uploaded file name does not look like a CSV file.
    #[error("invalid file type '{filename}', please upload a CSV file")]
    InvalidFileType { filename: String },

    /// The file is not valid UTF-8.
    #[error("file is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    /// The CSV reader rejected the content.
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// No header row could be read.
    #[error("no columns to parse from file")]
    NoColumns,

    /// A record carries more fields than the header declares.
    #[error("record {record} has {found} fields, expected at most {expected}")]
    RaggedRow {
        record: usize,
        expected: usize,
        found: usize,
    },
}

/// Errors raised while loading a schema descriptor.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("schema declares no columns")]
    Empty,

    #[error("column '{name}' is declared more than once")]
    DuplicateColumn { name: String },
}

/// How many rows made it into a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub plotted: usize,
    pub total: usize,
}

impl Coverage {
    pub fn new(plotted: usize, total: usize) -> Self {
        Self { plotted, total }
    }

    pub fn is_complete(&self) -> bool {
        self.plotted == self.total
    }

    /// Lead-in for two-variable messages, empty when no row was dropped.
    pub fn dropped_note(&self) -> String {
        if self.is_complete() {
            String::new()
        } else {
            format!(
                "Plotting {} of {} responses (missing values excluded). ",
                self.plotted, self.total
            )
        }
    }
}

impl std::fmt::Display for Coverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Plotting {} of {} responses.", self.plotted, self.total)
    }
}

/// Named conditions under which no chart can be produced for a selection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Upload data to start the analysis.")]
    NoDataset,

    /// Fewer than `needed` columns were chosen.
    #[error("{}", selection_prompt(.needed))]
    NoSelection { needed: usize },

    #[error("Error: Column '{column}' not found.")]
    ColumnNotFound { column: String },

    #[error("No valid data found for {columns}.")]
    NoValidData { columns: String },

    #[error("{coverage} Cannot plot '{column}' of type {kind}.")]
    UnsupportedType {
        column: String,
        kind: VariableKind,
        coverage: Coverage,
    },

    #[error("{}Cannot plot {first} vs {second}.", dropped_prefix(.coverage))]
    UnsupportedPair {
        first: VariableKind,
        second: VariableKind,
        coverage: Coverage,
    },
}

fn dropped_prefix(coverage: &Coverage) -> String {
    coverage.dropped_note()
}

fn selection_prompt(needed: &usize) -> &'static str {
    if *needed > 1 {
        "Select two variables."
    } else {
        "Select a variable from the dropdown."
    }
}

/// How prominently a status message should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Notice,
    Warning,
}

impl AnalysisError {
    pub fn severity(&self) -> Severity {
        match self {
            AnalysisError::NoDataset | AnalysisError::NoSelection { .. } => Severity::Info,
            AnalysisError::NoValidData { .. }
            | AnalysisError::UnsupportedType { .. }
            | AnalysisError::UnsupportedPair { .. } => Severity::Notice,
            AnalysisError::ColumnNotFound { .. } => Severity::Warning,
        }
    }
}
