//! Excel workbook parser (xlsx)

use std::borrow::Cow;
use std::io::Cursor;

use calamine::{open_workbook_from_rs, CellErrorType, Data, Range, Reader, Xlsx};
use chrono::NaiveTime;

use crate::error::{Result, SweepError};
use crate::model::{CellValue, Column, Table};

use super::{is_missing, normalize_headers, Parser};

/// Parser for Excel files. Only the first worksheet is read.
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn parse(&self, bytes: &[u8]) -> Result<Table> {
        let mut workbook = open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SweepError::Parse("No sheets found in workbook".to_string()))?;

        let range: Range<Data> = workbook.worksheet_range(&sheet_name)?;

        parse_range(range)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("xlsx")
    }
}

fn parse_range(range: Range<Data>) -> Result<Table> {
    let mut rows = range.rows();

    // First row is header
    let header_row = rows
        .next()
        .ok_or_else(|| SweepError::Parse("Empty sheet".to_string()))?;

    let columns: Vec<Column> = normalize_headers(header_row.iter().map(cell_to_string))
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, i))
        .collect();

    let mut table = Table::new(columns);

    // Read data rows
    for (line_num, row) in rows.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
        table.add_row(cells, line_num + 2); // +2 for 1-indexing and header
    }

    table.infer_column_types();

    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => {
            if is_missing(s) {
                CellValue::Null
            } else {
                CellValue::String(Cow::Owned(s.clone()))
            }
        }
        Data::Float(f) => {
            // Check if it's actually an integer
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) if datetime.time() == NaiveTime::MIN => {
                CellValue::Date(datetime.date())
            }
            Some(datetime) => CellValue::DateTime(datetime),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                CellValue::DateTime(dt)
            } else if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                CellValue::Date(d)
            } else {
                CellValue::String(Cow::Owned(s.clone()))
            }
        }
        Data::DurationIso(s) => CellValue::String(Cow::Owned(s.clone())),
        Data::Error(CellErrorType::NA) => CellValue::Null,
        Data::Error(e) => CellValue::String(Cow::Owned(format!("#{:?}", e))),
    }
}
