//! Table encoders for exporting converted files

use std::path::Path;

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook};
use tracing::debug;

use crate::config::ExportFormat;
use crate::error::{Result, SweepError};
use crate::model::{format_float, CellValue, Table};

/// A serialized table ready to be offered for download
#[derive(Debug, Clone)]
pub struct EncodedFile {
    pub bytes: Vec<u8>,
    /// Original base name with the extension of the target format
    pub file_name: String,
    pub mime_type: &'static str,
}

/// Trait for table serializers
pub trait Encoder {
    /// Serialize the table; the row index is never written
    fn encode(&self, table: &Table) -> Result<Vec<u8>>;
}

/// Comma-separated UTF-8 output with a header row
pub struct CsvEncoder;

/// Single-worksheet xlsx output with a header row
pub struct ExcelEncoder;

/// Factory for creating encoders
pub struct EncoderFactory;

impl EncoderFactory {
    /// Create an encoder for the requested format
    pub fn create(format: ExportFormat) -> Box<dyn Encoder> {
        match format {
            ExportFormat::Csv => Box::new(CsvEncoder),
            ExportFormat::Excel => Box::new(ExcelEncoder),
        }
    }
}

/// Encode `table` in `format`, naming the result after `original_name`
pub fn encode(table: &Table, format: ExportFormat, original_name: &str) -> Result<EncodedFile> {
    let bytes = EncoderFactory::create(format).encode(table)?;
    let file_name = suggested_file_name(original_name, format);
    debug!(file = %file_name, bytes = bytes.len(), %format, "encoded table");

    Ok(EncodedFile {
        bytes,
        file_name,
        mime_type: format.mime_type(),
    })
}

/// Base name of `original` with its extension replaced by the format's
pub fn suggested_file_name(original: &str, format: ExportFormat) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export");
    format!("{}{}", stem, format.extension())
}

impl Encoder for CsvEncoder {
    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        // Without columns every line, the header included, is empty
        if table.column_count() == 0 {
            return Ok("\n".repeat(table.row_count() + 1).into_bytes());
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        let to_encoding = |e: csv::Error| SweepError::Encoding(e.to_string());

        writer
            .write_record(table.column_names())
            .map_err(to_encoding)?;

        for row in &table.rows {
            writer
                .write_record(row.cells.iter().map(csv_field))
                .map_err(to_encoding)?;
        }

        writer
            .into_inner()
            .map_err(|e| SweepError::Encoding(e.to_string()))
    }
}

fn csv_field(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => String::new(),
        CellValue::Bool(true) => "True".to_string(),
        CellValue::Bool(false) => "False".to_string(),
        CellValue::Int(i) => i.to_string(),
        CellValue::Float(f) => format_float(*f),
        CellValue::String(s) => s.to_string(),
        CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

impl Encoder for ExcelEncoder {
    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let header = Format::new().set_bold();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

        for (col_idx, column) in table.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col_num(col_idx)?, &column.name, &header)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            let r = row_num(row_idx + 1)?;
            for (col_idx, cell) in row.cells.iter().enumerate() {
                let c = col_num(col_idx)?;
                match cell {
                    CellValue::Null => {}
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(r, c, *b)?;
                    }
                    CellValue::Int(i) => {
                        worksheet.write_number(r, c, *i as f64)?;
                    }
                    CellValue::Float(f) if f.is_finite() => {
                        worksheet.write_number(r, c, *f)?;
                    }
                    CellValue::Float(f) => {
                        return Err(SweepError::Encoding(format!(
                            "cannot store {} in column '{}' row {}",
                            f,
                            table.columns[col_idx].name,
                            row_idx + 1
                        )));
                    }
                    CellValue::String(s) => {
                        worksheet.write_string(r, c, &**s)?;
                    }
                    CellValue::Date(d) => {
                        worksheet.write_datetime_with_format(r, c, d, &date_format)?;
                    }
                    CellValue::DateTime(dt) => {
                        worksheet.write_datetime_with_format(r, c, dt, &datetime_format)?;
                    }
                }
            }
        }

        // The read-back range ends at the last non-empty cell, so a trailing
        // all-missing row keeps a blank string that loads as missing.
        if let Some(last) = table.rows.last() {
            if !last.cells.is_empty() && last.cells.iter().all(CellValue::is_null) {
                worksheet.write_string(row_num(table.row_count())?, 0, " ")?;
            }
        }

        worksheet.autofit();

        Ok(workbook.save_to_buffer()?)
    }
}

fn row_num(index: usize) -> Result<RowNum> {
    RowNum::try_from(index)
        .map_err(|_| SweepError::Encoding(format!("row {} exceeds the sheet limit", index)))
}

fn col_num(index: usize) -> Result<ColNum> {
    ColNum::try_from(index)
        .map_err(|_| SweepError::Encoding(format!("column {} exceeds the sheet limit", index)))
}
