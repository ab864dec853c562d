//! Configuration handling for datasweep

use std::path::PathBuf;

use serde::Serialize;

/// Target format for converted files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    /// Extension of exported files, including the dot
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => ".csv",
            ExportFormat::Excel => ".xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Excel => write!(f, "Excel"),
        }
    }
}

/// What to do when a numeric column has no values to average
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UndefinedMeanPolicy {
    /// Report an error and leave the table unchanged
    #[default]
    Fail,
    /// Skip the column, keeping its cells missing
    LeaveMissing,
    /// Fill the column with zeros
    Zero,
}

impl std::str::FromStr for UndefinedMeanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(UndefinedMeanPolicy::Fail),
            "leave" | "leave-missing" => Ok(UndefinedMeanPolicy::LeaveMissing),
            "zero" => Ok(UndefinedMeanPolicy::Zero),
            _ => Err(format!("Unknown undefined-mean policy: {}", s)),
        }
    }
}

/// Output format for the batch report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(ReportFormat::Terminal),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

/// Operations requested for every file of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct Operations {
    /// Remove duplicate rows
    pub remove_duplicates: bool,
    /// Fill missing numeric cells with the column mean
    pub fill_missing: bool,
    /// Behaviour of mean filling for columns without values
    pub undefined_mean: UndefinedMeanPolicy,
    /// Columns to keep; `None` keeps all of them
    pub columns: Option<Vec<String>>,
    /// Sample two numeric columns for a bar chart
    pub chart: bool,
    /// Convert the result to this format
    pub export: Option<ExportFormat>,
    /// Number of rows shown in the preview
    pub preview_rows: usize,
}

impl Default for Operations {
    fn default() -> Self {
        Self {
            remove_duplicates: false,
            fill_missing: false,
            undefined_mean: UndefinedMeanPolicy::default(),
            columns: None,
            chart: false,
            export: None,
            preview_rows: 5,
        }
    }
}

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable duplicate removal
    pub fn with_remove_duplicates(mut self, enabled: bool) -> Self {
        self.remove_duplicates = enabled;
        self
    }

    /// Enable mean filling of missing numeric cells
    pub fn with_fill_missing(mut self, enabled: bool) -> Self {
        self.fill_missing = enabled;
        self
    }

    pub fn with_undefined_mean(mut self, policy: UndefinedMeanPolicy) -> Self {
        self.undefined_mean = policy;
        self
    }

    /// Restrict the output to these columns
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_chart(mut self, enabled: bool) -> Self {
        self.chart = enabled;
        self
    }

    /// Set the conversion target
    pub fn with_export(mut self, format: ExportFormat) -> Self {
        self.export = Some(format);
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }
}

/// Configuration for one datasweep run
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Files to process, in order
    pub files: Vec<PathBuf>,
    /// Per-file operations
    pub operations: Operations,
    /// Directory receiving converted files
    pub output_dir: PathBuf,
    /// Report format
    pub report_format: ReportFormat,
}

impl Config {
    /// Create a new Config for the given files
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            output_dir: PathBuf::from("."),
            ..Default::default()
        }
    }

    /// Set the per-file operations
    pub fn with_operations(mut self, operations: Operations) -> Self {
        self.operations = operations;
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set the report format
    pub fn with_report_format(mut self, format: ReportFormat) -> Self {
        self.report_format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("excel".parse::<ExportFormat>(), Ok(ExportFormat::Excel));
        assert_eq!("xlsx".parse::<ExportFormat>(), Ok(ExportFormat::Excel));
        assert!("parquet".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_format_metadata() {
        assert_eq!(ExportFormat::Csv.mime_type(), "text/csv");
        assert_eq!(ExportFormat::Excel.extension(), ".xlsx");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("leave".parse(), Ok(UndefinedMeanPolicy::LeaveMissing));
        assert_eq!("ZERO".parse(), Ok(UndefinedMeanPolicy::Zero));
    }

    #[test]
    fn test_builders() {
        let ops = Operations::new()
            .with_remove_duplicates(true)
            .with_columns(vec!["a".into()])
            .with_export(ExportFormat::Excel);
        assert!(ops.remove_duplicates);
        assert!(!ops.fill_missing);
        assert_eq!(ops.preview_rows, 5);

        let config = Config::new(vec![PathBuf::from("a.csv")]).with_operations(ops.clone());
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.operations, ops);
    }
}
