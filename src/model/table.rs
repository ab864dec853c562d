//! Table, Row, and Cell data structures

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use rustc_hash::FxHashSet;
use serde::Serialize;

use super::schema::{CellType, Column};

/// A cell value with type information
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Cow<'static, str>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            // Cross-type numeric comparison
            (CellValue::Int(a), CellValue::Float(b)) => (*a as f64) == *b,
            (CellValue::Float(a), CellValue::Int(b)) => *a == (*b as f64),
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    // Int and Float share a tag so that values equal across the two variants
    // hash the same.
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            CellValue::Null => 0u8.hash(state),
            CellValue::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            CellValue::Int(i) => {
                2u8.hash(state);
                float_bits(*i as f64).hash(state);
            }
            CellValue::Float(f) => {
                2u8.hash(state);
                float_bits(*f).hash(state);
            }
            CellValue::String(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            CellValue::Date(d) => {
                4u8.hash(state);
                d.hash(state);
            }
            CellValue::DateTime(dt) => {
                5u8.hash(state);
                dt.hash(state);
            }
        }
    }
}

fn float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

/// Format a float the way exported files write it: integral values keep a
/// trailing `.0` so the column reads back as floating point.
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

impl CellValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric value of the cell, if it holds a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Type tag of this single value
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Null => CellType::Null,
            CellValue::Bool(_) => CellType::Bool,
            CellValue::Int(_) => CellType::Int,
            CellValue::Float(_) => CellType::Float,
            CellValue::String(_) => CellType::String,
            CellValue::Date(_) => CellType::Date,
            CellValue::DateTime(_) => CellType::DateTime,
        }
    }

    /// Convert to a display string
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed("NaN"),
            CellValue::Bool(b) => Cow::Owned(b.to_string()),
            CellValue::Int(i) => Cow::Owned(i.to_string()),
            CellValue::Float(f) => Cow::Owned(format_float(*f)),
            CellValue::String(s) => Cow::Borrowed(s.as_ref()),
            CellValue::Date(d) => Cow::Owned(d.to_string()),
            CellValue::DateTime(dt) => Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(Cow::Owned(s.to_string()))
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(Cow::Owned(s))
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// A row in the table
#[derive(Debug, Clone)]
pub struct Row {
    /// Cell values in column order
    pub cells: Vec<CellValue>,
    /// Original line/row number in source file (1-indexed)
    pub source_line: usize,
}

impl Row {
    pub fn new(cells: Vec<CellValue>, source_line: usize) -> Self {
        Self { cells, source_line }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A table containing columns and rows
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// All rows in the table
    pub rows: Vec<Row>,
}

impl PartialEq for Table {
    /// Tables are equal when they have the same column names and the same
    /// cells; inferred types and source lines are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.column_names().eq(other.column_names())
            && self.rows.len() == other.rows.len()
            && self
                .rows
                .iter()
                .zip(&other.rows)
                .all(|(a, b)| a.cells == b.cells)
    }
}

impl Table {
    /// Create a new empty table with column definitions
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from header names and row cells, inferring column types
    pub fn from_rows<S: Into<String>>(names: Vec<S>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column::new(name, i))
            .collect();
        let mut table = Table::new(columns);
        for (i, cells) in rows.into_iter().enumerate() {
            table.add_row(cells, i + 2);
        }
        table.infer_column_types();
        table
    }

    /// Add a row to the table, padding short rows with nulls
    pub fn add_row(&mut self, mut cells: Vec<CellValue>, source_line: usize) {
        cells.resize(self.column_count(), CellValue::Null);
        self.rows.push(Row::new(cells, source_line));
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in table order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Columns whose inferred type is numeric, in table order
    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// Iterate over the cells of one column
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Copy of the first `n` rows
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Recompute every column's inferred type from its cells
    pub fn infer_column_types(&mut self) {
        for col_idx in 0..self.column_count() {
            let inferred = self
                .column_values(col_idx)
                .fold(CellType::Null, |acc, cell| acc.widen(cell.cell_type()));

            if let Some(col) = self.columns.get_mut(col_idx) {
                col.inferred_type = inferred;
            }
        }
    }

    /// Keep only the named columns, preserving table order.
    ///
    /// Names not present in the table are ignored. An empty selection leaves
    /// a table with no columns and the original row count.
    pub fn project<S: AsRef<str>>(&mut self, names: &[S]) {
        let selected: FxHashSet<&str> = names.iter().map(|n| n.as_ref()).collect();
        let keep: Vec<usize> = self
            .columns
            .iter()
            .filter(|c| selected.contains(c.name.as_str()))
            .map(|c| c.index)
            .collect();

        if keep.len() == self.columns.len() {
            return;
        }

        self.columns = keep
            .iter()
            .enumerate()
            .map(|(new_idx, &old_idx)| {
                let old = &self.columns[old_idx];
                Column::with_type(old.name.clone(), new_idx, old.inferred_type)
            })
            .collect();

        for row in &mut self.rows {
            let mut cells = std::mem::take(&mut row.cells);
            row.cells = keep
                .iter()
                .map(|&i| std::mem::replace(&mut cells[i], CellValue::Null))
                .collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["name", "age", "score"],
            vec![
                vec!["ann".into(), 31i64.into(), 1.5f64.into()],
                vec!["bob".into(), CellValue::Null, 2.0f64.into()],
            ],
        )
    }

    #[test]
    fn test_int_float_equality_hashes_alike() {
        use rustc_hash::FxHasher;

        let hash = |v: &CellValue| {
            let mut h = FxHasher::default();
            v.hash(&mut h);
            h.finish()
        };

        assert_eq!(CellValue::Int(1), CellValue::Float(1.0));
        assert_eq!(hash(&CellValue::Int(1)), hash(&CellValue::Float(1.0)));
        assert_eq!(CellValue::Float(f64::NAN), CellValue::Float(f64::NAN));
        assert_ne!(CellValue::Null, CellValue::from(""));
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(-3.0), "-3.0");
        assert_eq!(format_float(f64::NAN), "NaN");
    }

    #[test]
    fn test_infer_types() {
        let table = sample();
        assert_eq!(table.columns[0].inferred_type, CellType::String);
        assert_eq!(table.columns[1].inferred_type, CellType::Int);
        assert_eq!(table.columns[2].inferred_type, CellType::Float);
        let numeric: Vec<_> = table.numeric_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(numeric, vec!["age", "score"]);
    }

    #[test]
    fn test_project_preserves_table_order() {
        let mut table = sample();
        table.project(&["score", "name"]);

        let names: Vec<_> = table.column_names().collect();
        assert_eq!(names, vec!["name", "score"]);
        assert_eq!(table.columns[1].index, 1);
        assert_eq!(table.rows[0].cells, vec![CellValue::from("ann"), CellValue::Float(1.5)]);
    }

    #[test]
    fn test_project_all_is_identity() {
        let original = sample();
        let mut table = original.clone();
        let names: Vec<String> = table.column_names().map(String::from).collect();
        table.project(&names);
        assert_eq!(table, original);
    }

    #[test]
    fn test_project_empty_keeps_rows() {
        let mut table = sample();
        table.project::<&str>(&[]);
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 2);
        assert!(table.rows.iter().all(|r| r.cells.is_empty()));
    }

    #[test]
    fn test_project_ignores_unknown_names() {
        let mut table = sample();
        table.project(&["age", "missing"]);
        let names: Vec<_> = table.column_names().collect();
        assert_eq!(names, vec!["age"]);
    }

    #[test]
    fn test_head() {
        let table = sample();
        assert_eq!(table.head(1).row_count(), 1);
        assert_eq!(table.head(10).row_count(), 2);
    }
}
