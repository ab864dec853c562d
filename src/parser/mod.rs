//! Table loader: turns uploaded bytes into a [`Table`]

mod csv;
mod excel;

use std::path::Path;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::error::{Result, SweepError};
use crate::model::Table;

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;

/// Trait for parsing tabular data from an in-memory upload
pub trait Parser: Send + Sync {
    /// Parse raw bytes and return a Table
    fn parse(&self, bytes: &[u8]) -> Result<Table>;

    /// Check if this parser can handle the given file extension (without dot)
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for picking a parser based on the declared file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(CsvParser), Box::new(ExcelParser)],
        }
    }

    /// Get a parser for the given file name
    pub fn get_parser(&self, declared_name: &str) -> Result<&dyn Parser> {
        let ext = file_extension(declared_name);
        let bare = ext.trim_start_matches('.');

        for parser in &self.parsers {
            if !bare.is_empty() && parser.supports_extension(bare) {
                return Ok(parser.as_ref());
            }
        }

        Err(SweepError::UnsupportedFormat(ext))
    }

    /// Parse an upload using the parser matching its declared name
    pub fn load(&self, bytes: &[u8], declared_name: &str) -> Result<Table> {
        let parser = self.get_parser(declared_name)?;

        if let Some(sniffed) = detect_format(bytes) {
            let declared = file_extension(declared_name);
            if declared.trim_start_matches('.') != sniffed {
                warn!(file = declared_name, sniffed, "content does not look like its extension");
            }
        }

        let table = parser.parse(bytes)?;
        debug!(
            file = declared_name,
            rows = table.row_count(),
            columns = table.column_count(),
            "loaded table"
        );
        Ok(table)
    }
}

/// Load a table from bytes, choosing the parser from the declared file name
pub fn load(bytes: &[u8], declared_name: &str) -> Result<Table> {
    ParserFactory::new().load(bytes, declared_name)
}

/// Lowercased extension of a file name including its leading dot, or an
/// empty string when the name has none
pub fn file_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Guess the format of an upload from its leading bytes
pub fn detect_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }

    // Excel ZIP format (xlsx)
    if &bytes[0..4] == b"PK\x03\x04" {
        return Some("xlsx");
    }

    // Old Excel format (xls)
    if &bytes[0..4] == b"\xD0\xCF\x11\xE0" {
        return Some("xls");
    }

    if std::str::from_utf8(&bytes[..bytes.len().min(512)]).is_ok() {
        return Some("csv");
    }

    None
}

/// Spellings read as a missing cell
const NA_VALUES: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Whether a text cell denotes a missing value, ignoring surrounding
/// whitespace
pub(crate) fn is_missing(text: &str) -> bool {
    NA_VALUES.contains(&text.trim())
}

/// Make header names usable as unique column names.
///
/// Blank names become `Unnamed: {i}`; repeated names get `.1`, `.2`, ...
/// suffixes in order of appearance.
pub(crate) fn normalize_headers<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let names: Vec<String> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if name.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            }
        })
        .collect();

    let mut used: FxHashSet<String> = FxHashSet::default();
    let mut result = Vec::with_capacity(names.len());

    for name in names {
        let mut candidate = name.clone();
        let mut suffix = 1;
        while used.contains(&candidate) {
            candidate = format!("{}.{}", name, suffix);
            suffix += 1;
        }
        used.insert(candidate.clone());
        result.push(candidate);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("data.CSV"), ".csv");
        assert_eq!(file_extension("book.final.xlsx"), ".xlsx");
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension(".csv"), "");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load(b"a,b\n1,2\n", "report.txt").unwrap_err();
        assert!(matches!(err, SweepError::UnsupportedFormat(ref e) if e == ".txt"));

        let err = load(b"a,b\n1,2\n", "noext").unwrap_err();
        assert!(matches!(err, SweepError::UnsupportedFormat(ref e) if e.is_empty()));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let table = load(b"a,b\n1,2\n", "UPPER.CSV").unwrap();
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(b"PK\x03\x04rest"), Some("xlsx"));
        assert_eq!(detect_format(b"a,b\n1,2"), Some("csv"));
        assert_eq!(detect_format(b"ab"), None);
    }

    #[test]
    fn test_is_missing() {
        assert!(is_missing(""));
        assert!(is_missing("   "));
        assert!(is_missing(" NA "));
        assert!(is_missing("#N/A"));
        assert!(!is_missing("na"));
        assert!(!is_missing("0"));
    }

    #[test]
    fn test_normalize_headers() {
        let names = vec!["a", "", "a", "b", "a", "a.1"]
            .into_iter()
            .map(String::from);
        assert_eq!(
            normalize_headers(names),
            vec!["a", "Unnamed: 1", "a.1", "b", "a.2", "a.1.1"]
        );
    }
}
