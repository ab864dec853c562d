//! datasweep - Convert tabular data between CSV and Excel

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use datasweep::config::{Config, ExportFormat, Operations, ReportFormat, UndefinedMeanPolicy};
use datasweep::output::render_to_stdout;
use datasweep::session::{BatchReport, Session, UploadedFile};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliExportFormat {
    Csv,
    Excel,
}

impl From<CliExportFormat> for ExportFormat {
    fn from(f: CliExportFormat) -> Self {
        match f {
            CliExportFormat::Csv => ExportFormat::Csv,
            CliExportFormat::Excel => ExportFormat::Excel,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliReportFormat {
    Terminal,
    Json,
}

impl From<CliReportFormat> for ReportFormat {
    fn from(f: CliReportFormat) -> Self {
        match f {
            CliReportFormat::Terminal => ReportFormat::Terminal,
            CliReportFormat::Json => ReportFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliUndefinedMean {
    Fail,
    Leave,
    Zero,
}

impl From<CliUndefinedMean> for UndefinedMeanPolicy {
    fn from(p: CliUndefinedMean) -> Self {
        match p {
            CliUndefinedMean::Fail => UndefinedMeanPolicy::Fail,
            CliUndefinedMean::Leave => UndefinedMeanPolicy::LeaveMissing,
            CliUndefinedMean::Zero => UndefinedMeanPolicy::Zero,
        }
    }
}

/// Convert CSV and Excel files with built-in data cleaning and charting
#[derive(Parser, Debug)]
#[command(name = "datasweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files to process (.csv or .xlsx)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Remove duplicate rows
    #[arg(long)]
    remove_duplicates: bool,

    /// Fill missing numeric values with the column mean
    #[arg(long)]
    fill_missing: bool,

    /// What to do with numeric columns that have no values to average
    #[arg(long, value_enum, default_value = "fail")]
    undefined_mean: CliUndefinedMean,

    /// Column(s) to keep (comma-separated); all columns when omitted
    #[arg(short, long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Show a bar chart of the first two numeric columns
    #[arg(long)]
    chart: bool,

    /// Convert files to this format
    #[arg(short, long, value_enum)]
    to: Option<CliExportFormat>,

    /// Directory for converted files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Number of rows shown in the preview
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,

    /// Report format
    #[arg(short, long, value_enum, default_value = "terminal")]
    report: CliReportFormat,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1), // Some files failed
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    let mut operations = Operations::new()
        .with_remove_duplicates(cli.remove_duplicates)
        .with_fill_missing(cli.fill_missing)
        .with_undefined_mean(cli.undefined_mean.into())
        .with_chart(cli.chart)
        .with_preview_rows(cli.preview_rows);
    if let Some(columns) = cli.columns {
        operations = operations.with_columns(columns);
    }
    if let Some(format) = cli.to {
        operations = operations.with_export(format.into());
    }

    let config = Config::new(cli.files)
        .with_operations(operations)
        .with_output_dir(cli.out_dir)
        .with_report_format(cli.report.into());

    let mut session = Session::new();
    let mut report = BatchReport::default();

    for path in &config.files {
        match UploadedFile::from_path(path) {
            Ok(file) => {
                let id = session.upload(file);
                report.files.push(session.report(id, &config.operations));
            }
            Err(e) => report.push_failure(path.display().to_string(), e),
        }
    }

    if report.has_exports() {
        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                config.output_dir.display()
            )
        })?;
        let written = report.write_exports(&config.output_dir, &config.files);
        info!(written, dir = %config.output_dir.display(), "wrote converted files");
    }

    render_to_stdout(&report, config.report_format)?;

    Ok(report.is_success())
}
