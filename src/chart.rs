//! Chart sampling: picks two numeric columns to draw as a bar chart

use serde::Serialize;

use crate::error::{Result, SweepError};
use crate::model::Table;

/// Two numeric series aligned by row position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSample {
    /// Names of the charted columns, in table order
    pub columns: [String; 2],
    /// One entry per table row; missing cells are gaps
    pub values: Vec<[Option<f64>; 2]>,
}

impl ChartSample {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest absolute value across both series, used for scaling bars
    pub fn max_magnitude(&self) -> f64 {
        self.values
            .iter()
            .flat_map(|pair| pair.iter().flatten())
            .filter(|v| v.is_finite())
            .fold(0.0f64, |acc, v| acc.max(v.abs()))
    }
}

/// Select the first two numeric columns of `table`.
///
/// Fails with [`SweepError::InsufficientNumericColumns`] when the table has
/// fewer than two numeric columns.
pub fn sample_for_chart(table: &Table) -> Result<ChartSample> {
    let numeric: Vec<_> = table.numeric_columns().take(2).collect();

    let [first, second] = numeric.as_slice() else {
        return Err(SweepError::InsufficientNumericColumns {
            found: numeric.len(),
        });
    };

    let values = table
        .rows
        .iter()
        .map(|row| {
            [
                row.get(first.index).and_then(|c| c.as_f64()),
                row.get(second.index).and_then(|c| c.as_f64()),
            ]
        })
        .collect();

    Ok(ChartSample {
        columns: [first.name.clone(), second.name.clone()],
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::load;

    #[test]
    fn test_picks_first_two_numeric_columns() {
        let table = load(b"name,x,label,y,z\na,1,p,2.5,9\nb,,q,4,9\n", "t.csv").unwrap();
        let sample = sample_for_chart(&table).unwrap();

        assert_eq!(sample.columns, ["x".to_string(), "y".to_string()]);
        assert_eq!(sample.values, vec![[Some(1.0), Some(2.5)], [None, Some(4.0)]]);
        assert_eq!(sample.max_magnitude(), 4.0);
    }

    #[test]
    fn test_insufficient_numeric_columns() {
        let table = load(b"name,x\na,1\n", "t.csv").unwrap();
        let err = sample_for_chart(&table).unwrap_err();
        assert!(matches!(err, SweepError::InsufficientNumericColumns { found: 1 }));

        let table = load(b"name\na\n", "t.csv").unwrap();
        assert!(matches!(
            sample_for_chart(&table),
            Err(SweepError::InsufficientNumericColumns { found: 0 })
        ));
    }
}
