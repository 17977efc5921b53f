use proptest::prelude::*;
use proptest::test_runner::Config;

use surveyplot::coerce::{coerce, parse_number, to_category, ColumnValues, UNKNOWN_CATEGORY};
use surveyplot::data::{Dataset, RawValue};
use surveyplot::multiselect::{expand_options, DEFAULT_DELIMITER};
use surveyplot::multivariate::multivariate_chart;
use surveyplot::{classify, ColumnKind, ColumnSpec, SurveySchema, VariableKind};

fn raw_value() -> impl Strategy<Value = RawValue> {
    prop_oneof![
        Just(RawValue::Missing),
        any::<f64>().prop_map(RawValue::Number),
        ".{0,12}".prop_map(RawValue::Text),
    ]
}

fn schema() -> SurveySchema {
    SurveySchema::new(
        vec![
            ColumnSpec::new("Score", ColumnKind::Numeric),
            ColumnSpec::new("Group", ColumnKind::Categorical),
            ColumnSpec::new("Channels", ColumnKind::MultiSelect),
        ],
        DEFAULT_DELIMITER,
    )
    .expect("schema")
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn numeric_coercion_round_trips_finite_values(x in -1.0e12f64..1.0e12) {
        prop_assert_eq!(parse_number(&RawValue::Text(x.to_string())), Some(x));
        prop_assert_eq!(parse_number(&RawValue::Number(x)), Some(x));
    }

    #[test]
    fn numeric_coercion_never_panics(text in "\\PC{0,16}") {
        if let Some(n) = parse_number(&RawValue::Text(text)) {
            prop_assert!(n.is_finite());
        }
    }

    #[test]
    fn categorical_coercion_never_missing(values in prop::collection::vec(raw_value(), 0..20)) {
        let rows: Vec<Vec<RawValue>> = values.iter().cloned().map(|v| vec![v]).collect();
        let data = coerce(&Dataset::new(vec!["Group".to_string()], rows), &schema());
        let column = data.column("Group").expect("group column");
        let categories = column.categorical().expect("categorical values");

        prop_assert_eq!(categories.len(), values.len());
        for (raw, category) in values.iter().zip(categories) {
            if raw.is_missing() {
                prop_assert_eq!(category.as_str(), UNKNOWN_CATEGORY);
            } else {
                prop_assert_eq!(category, &to_category(raw));
            }
        }
    }

    #[test]
    fn multi_select_expansion_is_order_independent(
        answers in prop::collection::vec(prop::option::of("[a-c ,]{0,10}"), 1..12)
            .prop_flat_map(|answers| (Just(answers.clone()), Just(answers).prop_shuffle()))
    ) {
        let (original, shuffled) = answers;
        let first = expand_options(original.iter().map(|a| a.as_deref()), DEFAULT_DELIMITER);
        let second = expand_options(shuffled.iter().map(|a| a.as_deref()), DEFAULT_DELIMITER);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn multi_select_never_counts_empty_tokens(
        answers in prop::collection::vec("[ab ,]{0,10}", 1..8)
    ) {
        let counts = expand_options(answers.iter().map(|a| Some(a.as_str())), DEFAULT_DELIMITER)
            .expect("at least one answer");
        for (option, count) in counts.as_map() {
            prop_assert!(!option.trim().is_empty());
            prop_assert!(*count > 0);
        }
    }

    #[test]
    fn classification_is_total_and_deterministic(
        name in prop_oneof![Just("Score"), Just("Group"), Just("Channels"), Just("Other")],
        values in prop::collection::vec(raw_value(), 1..6)
    ) {
        let rows: Vec<Vec<RawValue>> = values.into_iter().map(|v| vec![v]).collect();
        let data = coerce(&Dataset::new(vec![name.to_string()], rows), &schema());
        let column = data.column(name).expect("column");

        let kind = classify(&schema(), column);
        prop_assert_eq!(kind, classify(&schema(), column));
        let expected = match name {
            "Score" => VariableKind::Numeric,
            "Group" => VariableKind::Categorical,
            "Channels" => VariableKind::MultiSelect,
            _ => VariableKind::Unclassified,
        };
        prop_assert_eq!(kind, expected);
        if kind == VariableKind::Unclassified {
            prop_assert!(matches!(column.values, ColumnValues::Unknown(_)));
        }
    }

    #[test]
    fn numeric_by_categorical_is_symmetric(
        rows in prop::collection::vec((prop::option::of(0.0f64..100.0), prop::option::of("[xyz]")), 1..15)
    ) {
        let raw_rows: Vec<Vec<RawValue>> = rows
            .iter()
            .map(|(score, group)| {
                vec![
                    score.map(RawValue::Number).unwrap_or(RawValue::Missing),
                    group.clone().map(RawValue::Text).unwrap_or(RawValue::Missing),
                ]
            })
            .collect();
        let data = coerce(
            &Dataset::new(vec!["Score".to_string(), "Group".to_string()], raw_rows),
            &schema(),
        );

        let forward = multivariate_chart(&data, &schema(), "Score", "Group");
        let backward = multivariate_chart(&data, &schema(), "Group", "Score");
        match (forward, backward) {
            (Ok(forward), Ok(backward)) => {
                prop_assert_eq!(&forward.chart.geometry, &backward.chart.geometry);
                prop_assert_eq!(forward.chart.x_label.as_deref(), Some("Group"));
                prop_assert_eq!(backward.chart.x_label.as_deref(), Some("Group"));
                prop_assert_ne!(forward.chart.title, backward.chart.title);
            }
            (Err(forward), Err(backward)) => prop_assert_eq!(forward.severity(), backward.severity()),
            _ => prop_assert!(false, "only one direction produced a chart"),
        }
    }
}
