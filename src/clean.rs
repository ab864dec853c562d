//! Cleaning operations: duplicate removal and mean imputation

use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::debug;

use crate::config::UndefinedMeanPolicy;
use crate::error::{Result, SweepError};
use crate::model::{CellType, CellValue, Table};

/// Remove rows that repeat an earlier row across all columns.
///
/// The first occurrence is kept and the order of retained rows is preserved.
/// Returns the number of rows removed.
pub fn remove_duplicates(table: &mut Table) -> usize {
    let before = table.row_count();
    let mut seen: FxHashSet<Vec<CellValue>> = FxHashSet::default();

    table.rows.retain(|row| seen.insert(row.cells.clone()));

    let removed = before - table.row_count();
    debug!(removed, remaining = table.row_count(), "removed duplicate rows");
    removed
}

/// A column whose missing cells were replaced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilledColumn {
    pub column: String,
    pub mean: f64,
    pub cells_filled: usize,
}

/// Outcome of [`fill_missing_numeric`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillSummary {
    pub filled: Vec<FilledColumn>,
    /// Numeric columns left untouched because they had no values to average
    pub skipped: Vec<String>,
}

impl FillSummary {
    pub fn cells_filled(&self) -> usize {
        self.filled.iter().map(|c| c.cells_filled).sum()
    }
}

enum FillPlan {
    Fill { index: usize, mean: f64 },
    Skip { index: usize },
}

/// Replace missing cells in numeric columns with the column mean.
///
/// Means are computed from the non-missing values before any replacement.
/// Integer columns that receive a fill become float columns. Non-numeric
/// columns are untouched. When a numeric column has no values at all, the
/// outcome depends on `policy`; with [`UndefinedMeanPolicy::Fail`] the table
/// is left unchanged.
pub fn fill_missing_numeric(table: &mut Table, policy: UndefinedMeanPolicy) -> Result<FillSummary> {
    let mut plans = Vec::new();

    for column in table.numeric_columns() {
        let (sum, count, missing) = table.column_values(column.index).fold(
            (0.0f64, 0usize, 0usize),
            |(sum, count, missing), cell| match cell.as_f64() {
                Some(v) => (sum + v, count + 1, missing),
                None => (sum, count, missing + 1),
            },
        );

        if missing == 0 {
            continue;
        }

        if count > 0 {
            plans.push(FillPlan::Fill {
                index: column.index,
                mean: sum / count as f64,
            });
            continue;
        }

        match policy {
            UndefinedMeanPolicy::Fail => {
                return Err(SweepError::UndefinedMean {
                    column: column.name.clone(),
                })
            }
            UndefinedMeanPolicy::LeaveMissing => plans.push(FillPlan::Skip {
                index: column.index,
            }),
            UndefinedMeanPolicy::Zero => plans.push(FillPlan::Fill {
                index: column.index,
                mean: 0.0,
            }),
        }
    }

    let mut summary = FillSummary::default();

    for plan in plans {
        match plan {
            FillPlan::Fill { index, mean } => {
                let mut cells_filled = 0;
                for row in &mut table.rows {
                    let cell = &mut row.cells[index];
                    match *cell {
                        CellValue::Null => {
                            cells_filled += 1;
                            *cell = CellValue::Float(mean);
                        }
                        CellValue::Int(i) => *cell = CellValue::Float(i as f64),
                        _ => {}
                    }
                }

                let column = &mut table.columns[index];
                column.inferred_type = CellType::Float;
                debug!(column = %column.name, mean, cells_filled, "filled missing values");
                summary.filled.push(FilledColumn {
                    column: column.name.clone(),
                    mean,
                    cells_filled,
                });
            }
            FillPlan::Skip { index } => {
                summary.skipped.push(table.columns[index].name.clone());
            }
        }
    }

    Ok(summary)
}
