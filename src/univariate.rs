//! Single-variable chart selection.

use crate::classify::{classify, VariableKind};
use crate::coerce::{CoercedColumn, CoercedDataset};
use crate::error::{AnalysisError, Coverage, Severity};
use crate::ir::{Bar, ChartSpec, ChartView, Geometry};
use crate::multiselect::expand_options;
use crate::schema::SurveySchema;
use crate::stats::{histogram, value_counts, HISTOGRAM_BINS};

/// Distribution of one column over the given rows.
///
/// Histogram for numeric columns, bar-of-counts for categorical ones; `None`
/// for every other kind.
pub(crate) fn distribution(column: &CoercedColumn, kind: VariableKind, rows: &[usize]) -> Option<Geometry> {
    match kind {
        VariableKind::Numeric => {
            let values: Vec<f64> = rows.iter().filter_map(|&r| column.number_at(r)).collect();
            Some(Geometry::Histogram {
                bins: histogram(&values, HISTOGRAM_BINS),
            })
        }
        VariableKind::Categorical => Some(Geometry::Bar {
            bars: value_counts(rows.iter().filter_map(|&r| column.text_at(r))),
        }),
        VariableKind::MultiSelect | VariableKind::Unclassified => None,
    }
}

/// Option mention counts as bars, `None` when no option was mentioned.
fn option_bars(column: &CoercedColumn, delimiter: char) -> Option<Vec<Bar>> {
    let answers = column.text().unwrap_or_default();
    let counts = expand_options(answers.iter().map(|a| a.as_deref()), delimiter)?;
    if counts.is_empty() {
        return None;
    }
    Some(
        counts
            .ranked()
            .into_iter()
            .map(|(label, count)| Bar { label, count })
            .collect(),
    )
}

/// Chart the distribution of a single column.
pub fn univariate_chart(
    dataset: &CoercedDataset,
    schema: &SurveySchema,
    column_name: &str,
) -> Result<ChartView, AnalysisError> {
    let column = dataset
        .column(column_name)
        .ok_or_else(|| AnalysisError::ColumnNotFound {
            column: column_name.to_string(),
        })?;

    let rows = dataset.complete_rows(&[column]);
    if rows.is_empty() {
        return Err(AnalysisError::NoValidData {
            columns: format!("'{column_name}'"),
        });
    }

    let coverage = Coverage::new(rows.len(), dataset.row_count);
    let kind = classify(schema, column);
    tracing::debug!(column = column_name, %kind, plotted = rows.len(), "univariate selection");

    let (x_label, y_label, geometry) = if kind == VariableKind::MultiSelect {
        let Some(bars) = option_bars(column, schema.delimiter) else {
            return Ok(ChartView::blank(
                format!("{coverage} No multi-select data."),
                Severity::Notice,
            ));
        };
        ("Option".to_string(), "Mentions".to_string(), Geometry::Bar { bars })
    } else {
        let geometry = distribution(column, kind, &rows).ok_or_else(|| AnalysisError::UnsupportedType {
            column: column_name.to_string(),
            kind,
            coverage,
        })?;
        (column_name.to_string(), "Count".to_string(), geometry)
    };

    let chart = ChartSpec {
        title: Some(column_name.to_string()),
        x_label: Some(x_label),
        y_label: Some(y_label),
        legend_title: None,
        geometry,
    };
    Ok(ChartView::new(chart, coverage.to_string()))
}
