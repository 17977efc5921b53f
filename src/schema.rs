//! Survey schema descriptor.
//!
//! The schema names every survey question the dashboard knows about, the type
//! its answers are coerced to, and whether it is offered in the univariate
//! and multivariate selectors. Columns absent from an uploaded file are
//! skipped; columns absent from the schema are never analyzed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::SchemaError;

pub const PURCHASED_COL: &str = "In the past 24 months, have you purchased a portable power bank?";
pub const FREQUENCY_COL: &str =
    "How frequently do you leave your home for leisure, social, or work-related activities?";
pub const RELY_SMARTPHONE_COL: &str = "I rely on my smartphone for a variety of tasks when I’m away from home. (1= Strong Disagree, 5= Strong Agree)";
pub const FEEL_EASE_COL: &str =
    "I feel more at ease when I have a way to charge my phone on the go.";
pub const INTEREST_COL: &str = "How interested are you in this power bank concept? Scale of 1–5 (1 = Not at all interested, 5 = Very interested) (https://1moretime.co.za/products/one-more-night-blue-1)";
pub const SATISFACTION_COL: &str = "How satisfied are you with your current power bank(s)? (1 = Very dissatisfied, 5 = Very satisfied)";
pub const AGE_COL: &str = "Age";
pub const DISCOVERY_COL: &str = "Where do you typically learn about (or discover) new accessories or gadgets? (Select all that apply)";
pub const OWNERSHIP_COUNT_COL: &str = "How many power banks do you currently own?";
pub const KNOWLEDGE_COL: &str = "What is your current knowledge level regarding Fast Charging";
pub const IMPORTANCE_COL: &str =
    "How Important is Fast Charging in your decision to purchase a charger/Power Bank";
pub const APPEALING_COL: &str = "Which of the following aspects do you find most appealing?";
pub const CONCERN_COL: &str = "Which aspects concern you?";
pub const PRICE_VALUE_COL: &str = "At what price (in Rand) would you consider it a good value?";
pub const PURCHASE_DRIVER_COL: &str =
    "What would make you more likely to purchase this product? (Select all that apply)";
pub const SUSTAINABILITY_FREQ_COL: &str =
    "How often do you purchase sustainable/eco-friendly products?";
pub const RESIDENCE_COL: &str = "Primary Residence";
pub const BETA_TESTER_COL: &str = "Would you like to be a beta tester for Project Sepanya. You will recieve a free sample unit to test and a free final unit once the product development is completed.";

/// Expected type of a survey column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    /// Delimiter-separated list of chosen options.
    MultiSelect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    #[serde(default = "default_true")]
    pub univariate: bool,
    /// Multi-select columns are never offered here, whatever this says.
    #[serde(default = "default_true")]
    pub multivariate: bool,
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

impl ColumnSpec {
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            univariate: true,
            multivariate: kind != ColumnKind::MultiSelect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySchema {
    pub columns: Vec<ColumnSpec>,
    /// Separator between options in multi-select answers.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for SurveySchema {
    fn default() -> Self {
        Self::power_bank_survey()
    }
}

impl SurveySchema {
    /// Build a schema from column specs, rejecting duplicates.
    pub fn new(columns: Vec<ColumnSpec>, delimiter: char) -> Result<Self, SchemaError> {
        let schema = Self { columns, delimiter };
        schema.validate()?;
        Ok(schema)
    }

    /// The power bank concept survey the dashboard was built for.
    pub fn power_bank_survey() -> Self {
        use ColumnKind::{Categorical, MultiSelect, Numeric};

        let columns = [
            (PURCHASED_COL, Categorical),
            (FREQUENCY_COL, Categorical),
            (RELY_SMARTPHONE_COL, Numeric),
            (FEEL_EASE_COL, Numeric),
            (INTEREST_COL, Numeric),
            (SATISFACTION_COL, Numeric),
            (AGE_COL, Numeric),
            (OWNERSHIP_COUNT_COL, Numeric),
            (KNOWLEDGE_COL, Categorical),
            (IMPORTANCE_COL, Numeric),
            (APPEALING_COL, Categorical),
            (CONCERN_COL, Categorical),
            (PRICE_VALUE_COL, Numeric),
            (SUSTAINABILITY_FREQ_COL, Categorical),
            (RESIDENCE_COL, Categorical),
            (BETA_TESTER_COL, Categorical),
            (DISCOVERY_COL, MultiSelect),
            (PURCHASE_DRIVER_COL, MultiSelect),
        ]
        .into_iter()
        .map(|(name, kind)| ColumnSpec::new(name, kind))
        .collect();

        Self {
            columns,
            delimiter: default_delimiter(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let schema: SurveySchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let json = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::Empty);
        }
        let mut seen = HashSet::new();
        for col in &self.columns {
            if !seen.insert(col.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    name: col.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(|c| c.kind)
    }

    pub fn is_multi_select(&self, name: &str) -> bool {
        self.multi_select_columns().any(|c| c == name)
    }

    fn names_of(&self, kind: ColumnKind) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(move |c| c.kind == kind)
            .map(|c| c.name.as_str())
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &str> {
        self.names_of(ColumnKind::Numeric)
    }

    pub fn categorical_columns(&self) -> impl Iterator<Item = &str> {
        self.names_of(ColumnKind::Categorical)
    }

    pub fn multi_select_columns(&self) -> impl Iterator<Item = &str> {
        self.names_of(ColumnKind::MultiSelect)
    }

    /// Columns offered for single-variable analysis, in selector order.
    pub fn univariate_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.univariate)
            .map(|c| c.name.as_str())
    }

    /// Columns offered for two-variable analysis, in selector order.
    pub fn multivariate_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.multivariate && c.kind != ColumnKind::MultiSelect)
            .map(|c| c.name.as_str())
    }
}
