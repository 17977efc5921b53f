use anyhow::{anyhow, Result};
use serde_json::Value;

/// A single cell as it arrived from the upload.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Missing,
    Text(String),
    Number(f64),
}

impl RawValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }

    /// Textual form of the value, `None` when missing.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Missing => None,
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Number(n) => Some(format_number(*n)),
        }
    }
}

/// Shortest textual form of a number, integral values without a fraction.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

static MISSING: RawValue = RawValue::Missing;

/// Uploaded survey responses: one row per respondent.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<RawValue>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of one column in row order, `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &RawValue> + '_> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(move |row| row.get(idx).unwrap_or(&MISSING)),
        )
    }

    /// Create a Dataset from a JSON array of objects (records).
    ///
    /// Headers are the union of keys across all records; keys a record lacks
    /// are missing.
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        let mut headers: Vec<String> = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;
            for key in obj.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            // Checked above
            let Some(obj) = item.as_object() else { continue };

            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let val = match obj.get(header) {
                    Some(Value::String(s)) => RawValue::Text(s.clone()),
                    Some(Value::Number(n)) => n
                        .as_f64()
                        .map(RawValue::Number)
                        .unwrap_or(RawValue::Missing),
                    Some(Value::Bool(b)) => RawValue::Text(b.to_string()),
                    Some(Value::Null) | None => RawValue::Missing,
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                row.push(val);
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }
}
