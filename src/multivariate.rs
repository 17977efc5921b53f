//! Two-variable chart selection.
//!
//! The presentation depends only on the kinds of the two columns:
//!
//! | first       | second      | chart                                   |
//! |-------------|-------------|-----------------------------------------|
//! | numeric     | numeric     | scatter with least squares trend line   |
//! | numeric     | categorical | box plot grouped by the categorical     |
//! | categorical | numeric     | box plot grouped by the categorical     |
//! | categorical | categorical | side-by-side counts, coloured by second |
//!
//! Selecting the same column twice shows its distribution instead.

use std::collections::HashMap;

use crate::classify::{classify, VariableKind};
use crate::coerce::{CoercedColumn, CoercedDataset};
use crate::error::{AnalysisError, Coverage};
use crate::ir::{BarSeries, BoxGroup, ChartSpec, ChartView, Geometry};
use crate::schema::SurveySchema;
use crate::stats::{box_summary, least_squares};
use crate::univariate::distribution;

/// Distinct values in order of first appearance, with their positions.
fn first_appearance<'a>(values: impl Iterator<Item = &'a str>) -> (Vec<String>, HashMap<&'a str, usize>) {
    let mut order = Vec::new();
    let mut index = HashMap::new();
    for v in values {
        index.entry(v).or_insert_with(|| {
            order.push(v.to_string());
            order.len() - 1
        });
    }
    (order, index)
}

fn scatter(x: &CoercedColumn, y: &CoercedColumn, rows: &[usize]) -> Geometry {
    let points: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|&r| Some((x.number_at(r)?, y.number_at(r)?)))
        .collect();
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();

    Geometry::Scatter {
        trend: least_squares(&xs, &ys),
        points,
    }
}

fn box_plot(numeric: &CoercedColumn, categorical: &CoercedColumn, rows: &[usize]) -> Geometry {
    let pairs: Vec<(&str, f64)> = rows
        .iter()
        .filter_map(|&r| Some((categorical.text_at(r)?, numeric.number_at(r)?)))
        .collect();

    let (categories, index) = first_appearance(pairs.iter().map(|(c, _)| *c));
    let mut points: Vec<Vec<f64>> = vec![Vec::new(); categories.len()];
    for (category, value) in &pairs {
        points[index[category]].push(*value);
    }

    let groups = categories
        .into_iter()
        .zip(points)
        .filter_map(|(category, points)| {
            Some(BoxGroup {
                category,
                summary: box_summary(&points)?,
                points,
            })
        })
        .collect();

    Geometry::BoxPlot { groups }
}

fn grouped_counts(x: &CoercedColumn, color: &CoercedColumn, rows: &[usize]) -> Geometry {
    let pairs: Vec<(&str, &str)> = rows
        .iter()
        .filter_map(|&r| Some((x.text_at(r)?, color.text_at(r)?)))
        .collect();

    let (categories, x_index) = first_appearance(pairs.iter().map(|(x, _)| *x));
    let (keys, key_index) = first_appearance(pairs.iter().map(|(_, k)| *k));

    let mut counts = vec![vec![0usize; categories.len()]; keys.len()];
    for (x, key) in &pairs {
        counts[key_index[key]][x_index[x]] += 1;
    }

    let series = keys
        .into_iter()
        .zip(counts)
        .map(|(key, counts)| BarSeries { key, counts })
        .collect();

    Geometry::GroupedBar { categories, series }
}

fn lookup<'a>(dataset: &'a CoercedDataset, name: &str) -> Result<&'a CoercedColumn, AnalysisError> {
    dataset.column(name).ok_or_else(|| AnalysisError::ColumnNotFound {
        column: name.to_string(),
    })
}

/// Chart how two columns relate.
pub fn multivariate_chart(
    dataset: &CoercedDataset,
    schema: &SurveySchema,
    first: &str,
    second: &str,
) -> Result<ChartView, AnalysisError> {
    let a = lookup(dataset, first)?;
    let b = lookup(dataset, second)?;

    let rows = dataset.complete_rows(&[a, b]);
    if rows.is_empty() {
        let columns = if first == second {
            format!("'{first}'")
        } else {
            format!("'{first}' and '{second}'")
        };
        return Err(AnalysisError::NoValidData { columns });
    }

    let coverage = Coverage::new(rows.len(), dataset.row_count);
    let (kind_a, kind_b) = (classify(schema, a), classify(schema, b));
    let unsupported = || AnalysisError::UnsupportedPair {
        first: kind_a,
        second: kind_b,
        coverage,
    };
    tracing::debug!(first, second, %kind_a, %kind_b, plotted = rows.len(), "multivariate selection");

    let chart = if first == second {
        let geometry = distribution(a, kind_a, &rows).ok_or_else(unsupported)?;
        ChartSpec {
            title: Some(format!("Distribution of {first}")),
            x_label: Some(first.to_string()),
            y_label: Some("Count".to_string()),
            legend_title: None,
            geometry,
        }
    } else {
        match (kind_a, kind_b) {
            (VariableKind::Numeric, VariableKind::Numeric) => ChartSpec {
                title: Some(format!("{first} vs. {second}")),
                x_label: Some(first.to_string()),
                y_label: Some(second.to_string()),
                legend_title: None,
                geometry: scatter(a, b, &rows),
            },
            (VariableKind::Numeric, VariableKind::Categorical) => ChartSpec {
                title: Some(format!("{first} by {second}")),
                x_label: Some(second.to_string()),
                y_label: Some(first.to_string()),
                legend_title: None,
                geometry: box_plot(a, b, &rows),
            },
            (VariableKind::Categorical, VariableKind::Numeric) => ChartSpec {
                title: Some(format!("{first} by {second}")),
                x_label: Some(first.to_string()),
                y_label: Some(second.to_string()),
                legend_title: None,
                geometry: box_plot(b, a, &rows),
            },
            (VariableKind::Categorical, VariableKind::Categorical) => ChartSpec {
                title: Some(format!("{first} by {second}")),
                x_label: Some(first.to_string()),
                y_label: Some("Count".to_string()),
                legend_title: Some(second.to_string()),
                geometry: grouped_counts(a, b, &rows),
            },
            _ => return Err(unsupported()),
        }
    };

    Ok(ChartView::new(chart, coverage.dropped_note().trim_end()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::coerce;
    use crate::data::Dataset;
    use crate::schema::{ColumnKind, ColumnSpec};
    use crate::univariate::univariate_chart;
    use serde_json::json;

    fn schema() -> SurveySchema {
        SurveySchema::new(
            vec![
                ColumnSpec::new("Age", ColumnKind::Numeric),
                ColumnSpec::new("Price", ColumnKind::Numeric),
                ColumnSpec::new("Residence", ColumnKind::Categorical),
                ColumnSpec::new("Purchased", ColumnKind::Categorical),
                ColumnSpec::new("Channels", ColumnKind::MultiSelect),
            ],
            ',',
        )
        .unwrap()
    }

    fn data() -> CoercedDataset {
        let value = json!([
            {"Age": 21, "Price": 300, "Residence": "City", "Purchased": "Yes", "Channels": "Friends"},
            {"Age": 35, "Price": 500, "Residence": "Town", "Purchased": "No", "Channels": "Store"},
            {"Age": 28, "Price": 450, "Residence": "City", "Purchased": "No", "Channels": null},
            {"Age": null, "Price": 350, "Residence": "Rural", "Purchased": "Yes", "Channels": "Friends"},
            {"Age": 42, "Price": "free", "Residence": null, "Purchased": "Yes", "Channels": "Store"}
        ]);
        coerce(&Dataset::from_json(&value).unwrap(), &schema())
    }

    #[test]
    fn test_numeric_pair_scatter_with_trend() {
        let view = multivariate_chart(&data(), &schema(), "Age", "Price").unwrap();
        assert_eq!(view.chart.title.as_deref(), Some("Age vs. Price"));
        assert_eq!(view.message, "Plotting 3 of 5 responses (missing values excluded).");
        let Geometry::Scatter { points, trend } = &view.chart.geometry else {
            panic!("expected scatter");
        };
        assert_eq!(points.len(), 3);
        let trend = trend.as_ref().unwrap();
        assert_eq!((trend.x_min, trend.x_max), (21.0, 35.0));
        assert!(trend.slope > 0.0);
    }

    #[test]
    fn test_numeric_categorical_symmetric_axes() {
        let forward = multivariate_chart(&data(), &schema(), "Age", "Residence").unwrap();
        let backward = multivariate_chart(&data(), &schema(), "Residence", "Age").unwrap();

        assert_eq!(forward.chart.geometry, backward.chart.geometry);
        assert_eq!(forward.chart.x_label.as_deref(), Some("Residence"));
        assert_eq!(backward.chart.x_label.as_deref(), Some("Residence"));
        assert_eq!(forward.chart.y_label, backward.chart.y_label);
        assert_ne!(forward.chart.title, backward.chart.title);

        let Geometry::BoxPlot { groups } = &forward.chart.geometry else {
            panic!("expected box plot");
        };
        let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        // Missing residence became "Unknown"; the row without an age is dropped
        assert_eq!(categories, vec!["City", "Town", "Unknown"]);
        assert_eq!(groups[0].points, vec![21.0, 28.0]);
        assert_eq!(groups[0].summary.median, 24.5);
    }

    #[test]
    fn test_categorical_pair_grouped_counts() {
        let view = multivariate_chart(&data(), &schema(), "Residence", "Purchased").unwrap();
        assert_eq!(view.chart.title.as_deref(), Some("Residence by Purchased"));
        assert_eq!(view.chart.legend_title.as_deref(), Some("Purchased"));
        assert_eq!(view.message, "");
        let Geometry::GroupedBar { categories, series } = &view.chart.geometry else {
            panic!("expected grouped bars");
        };
        assert_eq!(categories, &vec!["City", "Town", "Rural", "Unknown"]);
        assert_eq!(series[0].key, "Yes");
        assert_eq!(series[0].counts, vec![1, 0, 1, 1]);
        assert_eq!(series[1].key, "No");
        assert_eq!(series[1].counts, vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_same_categorical_matches_univariate() {
        let multi = multivariate_chart(&data(), &schema(), "Residence", "Residence").unwrap();
        let uni = univariate_chart(&data(), &schema(), "Residence").unwrap();
        assert_eq!(multi.chart.geometry, uni.chart.geometry);
        assert_eq!(multi.chart.title.as_deref(), Some("Distribution of Residence"));
    }

    #[test]
    fn test_same_numeric_is_histogram() {
        let view = multivariate_chart(&data(), &schema(), "Age", "Age").unwrap();
        assert!(matches!(view.chart.geometry, Geometry::Histogram { .. }));
    }

    #[test]
    fn test_multi_select_pair_unsupported() {
        let err = multivariate_chart(&data(), &schema(), "Channels", "Age").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::UnsupportedPair {
                first: VariableKind::MultiSelect,
                second: VariableKind::Numeric,
                coverage: Coverage::new(3, 5),
            }
        );
    }

    #[test]
    fn test_same_multi_select_unsupported() {
        let err = multivariate_chart(&data(), &schema(), "Channels", "Channels").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::UnsupportedPair {
                first: VariableKind::MultiSelect,
                second: VariableKind::MultiSelect,
                coverage: Coverage::new(4, 5),
            }
        );
    }

    #[test]
    fn test_same_unclassified_unsupported() {
        let value = json!([{"Note": "late", "Age": 1}, {"Note": null, "Age": 2}]);
        let data = coerce(&Dataset::from_json(&value).unwrap(), &schema());
        let err = multivariate_chart(&data, &schema(), "Note", "Note").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::UnsupportedPair {
                first: VariableKind::Unclassified,
                second: VariableKind::Unclassified,
                coverage: Coverage::new(1, 2),
            }
        );
    }

    #[test]
    fn test_missing_second_column() {
        let err = multivariate_chart(&data(), &schema(), "Age", "Height").unwrap_err();
        assert_eq!(err, AnalysisError::ColumnNotFound { column: "Height".into() });
    }

    #[test]
    fn test_no_overlapping_rows() {
        let value = json!([{"Age": 20, "Price": null}, {"Age": null, "Price": 10}]);
        let data = coerce(&Dataset::from_json(&value).unwrap(), &schema());
        let err = multivariate_chart(&data, &schema(), "Age", "Price").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::NoValidData {
                columns: "'Age' and 'Price'".into()
            }
        );
    }
}
