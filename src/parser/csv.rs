//! CSV parser

use std::borrow::Cow;

use crate::error::{Result, SweepError};
use crate::model::{CellValue, Column, Table};

use super::{is_missing, normalize_headers, Parser};

/// Parser for CSV files
pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(&self, bytes: &[u8]) -> Result<Table> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        // Read headers
        let headers = csv_reader.headers()?.clone();
        if headers.is_empty() {
            return Err(SweepError::Parse("No columns to parse from file".to_string()));
        }

        let columns: Vec<Column> = normalize_headers(headers.iter().map(String::from))
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column::new(name, i))
            .collect();

        let mut table = Table::new(columns);

        // Read rows
        for (line_num, result) in csv_reader.records().enumerate() {
            let source_line = line_num + 2; // +2 for 1-indexing and header
            let record = result?;

            if record.len() > table.column_count() {
                return Err(SweepError::Parse(format!(
                    "Expected {} fields in line {}, saw {}",
                    table.column_count(),
                    source_line,
                    record.len()
                )));
            }

            let cells: Vec<CellValue> = record.iter().map(parse_cell_value).collect();

            // Short rows are padded with nulls
            table.add_row(cells, source_line);
        }

        table.infer_column_types();

        Ok(table)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("csv")
    }
}

/// Parse a string value into a CellValue with type inference
fn parse_cell_value(s: &str) -> CellValue {
    let trimmed = s.trim();

    if is_missing(s) {
        return CellValue::Null;
    }

    // Try parsing as boolean
    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }

    // Try parsing as integer
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }

    // Try parsing as float
    if let Ok(f) = trimmed.parse::<f64>() {
        return CellValue::Float(f);
    }

    // Try parsing as date
    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return CellValue::Date(date);
    }

    // Try parsing as datetime (ISO 8601)
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return CellValue::DateTime(dt);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return CellValue::DateTime(dt);
    }

    // Text is kept verbatim
    CellValue::String(Cow::Owned(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;

    #[test]
    fn test_parse_cell_value() {
        assert_eq!(parse_cell_value(""), CellValue::Null);
        assert_eq!(parse_cell_value("NA"), CellValue::Null);
        assert_eq!(parse_cell_value("null"), CellValue::Null);
        assert_eq!(parse_cell_value("TRUE"), CellValue::Bool(true));
        assert_eq!(parse_cell_value("false"), CellValue::Bool(false));
        assert_eq!(parse_cell_value("42"), CellValue::Int(42));
        assert_eq!(parse_cell_value(" 7 "), CellValue::Int(7));
        assert_eq!(parse_cell_value("3.14"), CellValue::Float(3.14));
        assert_eq!(
            parse_cell_value("2024-02-29"),
            CellValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert_eq!(
            parse_cell_value(" hello "),
            CellValue::String(Cow::Owned(" hello ".to_string()))
        );
    }

    #[test]
    fn test_missing_cells_and_types() {
        let table = CsvParser.parse(b"a,b\n1,\n,4\n1,\n").unwrap();

        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.columns[0].inferred_type, CellType::Int);
        assert_eq!(table.columns[1].inferred_type, CellType::Int);
        assert!(table.rows[0].cells[1].is_null());
        assert!(table.rows[1].cells[0].is_null());
        assert_eq!(table.rows[2].source_line, 4);
    }

    #[test]
    fn test_text_column_is_not_numeric() {
        let table = CsvParser.parse(b"id,label\n1,x\n2,3\n").unwrap();
        assert!(table.columns[0].is_numeric());
        assert!(!table.columns[1].is_numeric());
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = CsvParser.parse(b"a,b,c\n1\n").unwrap();
        assert_eq!(table.rows[0].cells.len(), 3);
        assert!(table.rows[0].cells[2].is_null());
    }

    #[test]
    fn test_long_rows_fail() {
        let err = CsvParser.parse(b"a,b\n1,2,3\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(CsvParser.parse(b""), Err(SweepError::Parse(_))));
    }

    #[test]
    fn test_header_only() {
        let table = CsvParser.parse(b"a,b\n").unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_bom_and_quoted_fields() {
        let table = CsvParser
            .parse(b"\xEF\xBB\xBFname,note\n\"Doe, J\",\"line\nbreak\"\n")
            .unwrap();
        assert_eq!(table.columns[0].name, "name");
        assert_eq!(table.rows[0].cells[0], CellValue::from("Doe, J"));
        assert_eq!(table.rows[0].cells[1], CellValue::from("line\nbreak"));
    }

    #[test]
    fn test_duplicate_headers_are_mangled() {
        let table = CsvParser.parse(b"x,x,\n1,2,3\n").unwrap();
        let names: Vec<_> = table.column_names().collect();
        assert_eq!(names, vec!["x", "x.1", "Unnamed: 2"]);
    }
}
