//! Type coercion of raw survey columns.
//!
//! Each schema column present in the upload is re-typed once, right after the
//! upload is parsed. Numeric columns tolerate junk answers (they become
//! missing), categorical columns never carry missing values afterwards.

use crate::data::{Dataset, RawValue};
use crate::schema::{ColumnKind, SurveySchema};

/// Category substituted for missing categorical answers.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<String>),
    MultiSelect(Vec<Option<String>>),
    /// Present in the file but not described by the schema.
    Unknown(Vec<Option<String>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoercedColumn {
    pub name: String,
    pub values: ColumnValues,
}

impl CoercedColumn {
    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Categorical(v) => v.len(),
            ColumnValues::MultiSelect(v) | ColumnValues::Unknown(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match &self.values {
            ColumnValues::Numeric(v) => v.get(row).map_or(true, Option::is_none),
            ColumnValues::Categorical(v) => row >= v.len(),
            ColumnValues::MultiSelect(v) | ColumnValues::Unknown(v) => {
                v.get(row).map_or(true, Option::is_none)
            }
        }
    }

    pub fn present_count(&self) -> usize {
        (0..self.len()).filter(|&row| !self.is_missing(row)).count()
    }

    pub fn numeric(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            ColumnValues::Numeric(v) => Some(v),
            _ => None,
        }
    }

    pub fn categorical(&self) -> Option<&[String]> {
        match &self.values {
            ColumnValues::Categorical(v) => Some(v),
            _ => None,
        }
    }

    pub fn number_at(&self, row: usize) -> Option<f64> {
        self.numeric()?.get(row).copied().flatten()
    }

    /// Category or raw text at `row`; numeric columns have none.
    pub fn text_at(&self, row: usize) -> Option<&str> {
        match &self.values {
            ColumnValues::Numeric(_) => None,
            ColumnValues::Categorical(v) => v.get(row).map(String::as_str),
            ColumnValues::MultiSelect(v) | ColumnValues::Unknown(v) => v.get(row)?.as_deref(),
        }
    }

    /// Raw text cells of multi-select and unknown columns.
    pub fn text(&self) -> Option<&[Option<String>]> {
        match &self.values {
            ColumnValues::MultiSelect(v) | ColumnValues::Unknown(v) => Some(v),
            _ => None,
        }
    }
}

/// The uploaded dataset after coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoercedDataset {
    pub columns: Vec<CoercedColumn>,
    pub row_count: usize,
}

impl CoercedDataset {
    pub fn column(&self, name: &str) -> Option<&CoercedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Indices of rows with a value in every one of `columns`.
    pub fn complete_rows(&self, columns: &[&CoercedColumn]) -> Vec<usize> {
        (0..self.row_count)
            .filter(|&row| columns.iter().all(|c| !c.is_missing(row)))
            .collect()
    }
}

/// Parse a raw cell as a finite number. Anything else is missing.
pub fn parse_number(raw: &RawValue) -> Option<f64> {
    let n = match raw {
        RawValue::Missing => return None,
        RawValue::Number(n) => *n,
        RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    n.is_finite().then_some(n)
}

/// Categorical form of a raw cell; missing becomes [`UNKNOWN_CATEGORY`].
pub fn to_category(raw: &RawValue) -> String {
    raw.as_text()
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
}

/// Coerce every column of `dataset` according to `schema`.
///
/// Schema columns missing from the upload are skipped without error.
pub fn coerce(dataset: &Dataset, schema: &SurveySchema) -> CoercedDataset {
    for spec in &schema.columns {
        if dataset.column_index(&spec.name).is_none() {
            tracing::debug!(column = %spec.name, "schema column not in upload, skipping");
        }
    }

    let mut columns = Vec::with_capacity(dataset.headers.len());
    for name in &dataset.headers {
        if columns.iter().any(|c: &CoercedColumn| &c.name == name) {
            tracing::warn!(column = %name, "duplicate header, keeping the first occurrence");
            continue;
        }
        let Some(raw) = dataset.column(name) else { continue };

        let values = match schema.kind_of(name) {
            Some(ColumnKind::Numeric) => {
                let mut unparsable = 0usize;
                let parsed: Vec<Option<f64>> = raw
                    .map(|v| {
                        let n = parse_number(v);
                        if n.is_none() && !v.is_missing() {
                            unparsable += 1;
                        }
                        n
                    })
                    .collect();
                if unparsable > 0 {
                    tracing::debug!(column = %name, unparsable, "non-numeric answers treated as missing");
                }
                ColumnValues::Numeric(parsed)
            }
            Some(ColumnKind::Categorical) => ColumnValues::Categorical(raw.map(to_category).collect()),
            Some(ColumnKind::MultiSelect) => ColumnValues::MultiSelect(raw.map(RawValue::as_text).collect()),
            None => ColumnValues::Unknown(raw.map(RawValue::as_text).collect()),
        };

        columns.push(CoercedColumn {
            name: name.clone(),
            values,
        });
    }

    CoercedDataset {
        columns,
        row_count: dataset.len(),
    }
}
