// CSV ingestion for uploaded survey exports

use csv::ReaderBuilder;

use crate::data::{Dataset, RawValue};
use crate::error::LoadError;

/// Cell contents treated as "no answer".
pub const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn to_raw_value(cell: &str) -> RawValue {
    if MISSING_TOKENS.contains(&cell) {
        RawValue::Missing
    } else {
        RawValue::Text(cell.to_string())
    }
}

/// Decode and parse an uploaded CSV file.
///
/// Every cell is kept as text; typing happens during coercion.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<Dataset, LoadError> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::NoColumns);
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > headers.len() {
            return Err(LoadError::RaggedRow {
                record: idx + 1,
                expected: headers.len(),
                found: record.len(),
            });
        }

        let mut row: Vec<RawValue> = record.iter().map(to_raw_value).collect();
        row.resize(headers.len(), RawValue::Missing);
        rows.push(row);
    }

    tracing::debug!(columns = headers.len(), rows = rows.len(), "parsed CSV");
    Ok(Dataset::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_basic() {
        let data = read_csv_bytes(b"Age,Sat\n25,4\n30,5\nx,3\n").unwrap();
        assert_eq!(data.headers, vec!["Age", "Sat"]);
        assert_eq!(data.len(), 3);
        assert_eq!(data.rows[2][0], RawValue::Text("x".into()));
    }

    #[test]
    fn test_missing_tokens_and_short_rows() {
        let data = read_csv_bytes(b"a,b,c\nNA,,1\n2\n").unwrap();
        assert!(data.rows[0][0].is_missing());
        assert!(data.rows[0][1].is_missing());
        assert_eq!(data.rows[0][2], RawValue::Text("1".into()));
        assert_eq!(data.rows[1].len(), 3);
        assert!(data.rows[1][2].is_missing());
    }

    #[test]
    fn test_bom_and_header_whitespace() {
        let data = read_csv_bytes("\u{feff} Primary   Residence ,Age\nCity,20\n".as_bytes()).unwrap();
        assert_eq!(data.headers[0], "Primary Residence");
    }

    #[test]
    fn test_quoted_multi_select() {
        let data = read_csv_bytes(b"Channels\n\"Social Media, Friends\"\nFriends\n").unwrap();
        assert_eq!(data.rows[0][0], RawValue::Text("Social Media, Friends".into()));
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let data = read_csv_bytes(b"a,b\n").unwrap();
        assert!(data.is_empty());
        assert_eq!(data.headers.len(), 2);
    }

    #[test]
    fn test_invalid_utf8() {
        let err = read_csv_bytes(&[b'a', b'\n', 0xff, 0xfe, b'\n']).unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
    }

    #[test]
    fn test_no_columns() {
        assert!(matches!(read_csv_bytes(b"").unwrap_err(), LoadError::NoColumns));
    }

    #[test]
    fn test_ragged_row() {
        let err = read_csv_bytes(b"a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, LoadError::RaggedRow { record: 1, expected: 2, found: 3 }));
    }
}
