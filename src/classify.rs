//! Variable classification used to pick a chart type.

use serde::Serialize;
use std::fmt;

use crate::coerce::{CoercedColumn, ColumnValues};
use crate::schema::SurveySchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    MultiSelect,
    Numeric,
    Categorical,
    Unclassified,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableKind::MultiSelect => "multi-select",
            VariableKind::Numeric => "numeric",
            VariableKind::Categorical => "categorical",
            VariableKind::Unclassified => "unclassified",
        };
        f.write_str(name)
    }
}

/// Classify a coerced column.
///
/// Schema membership in the multi-select list wins over the stored values.
pub fn classify(schema: &SurveySchema, column: &CoercedColumn) -> VariableKind {
    if schema.is_multi_select(&column.name) {
        return VariableKind::MultiSelect;
    }
    match column.values {
        ColumnValues::Numeric(_) => VariableKind::Numeric,
        ColumnValues::Categorical(_) => VariableKind::Categorical,
        ColumnValues::MultiSelect(_) => VariableKind::MultiSelect,
        ColumnValues::Unknown(_) => VariableKind::Unclassified,
    }
}
