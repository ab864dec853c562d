//! Colored terminal output

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::chart::ChartSample;
use crate::model::{format_float, Table};
use crate::session::{BatchReport, ChartOutcome, FileOutcome, FileReport};

use super::OutputFormatter;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Terminal output with colors
pub struct TerminalOutput {
    bar_width: usize,
    max_chart_rows: usize,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self {
            bar_width: 40,
            max_chart_rows: 20,
        }
    }

    /// Set the width of the longest bar and how many rows the chart shows
    pub fn with_chart_size(bar_width: usize, max_chart_rows: usize) -> Self {
        Self {
            bar_width,
            max_chart_rows,
        }
    }

    fn write_header(&self, writer: &mut dyn WriteColor, file: &FileReport, size_kb: Option<f64>) -> Result<()> {
        writeln!(writer, "{}", RULE)?;
        writeln!(writer, " File Name: {}", file.name)?;
        if let Some(kb) = size_kb {
            writeln!(writer, " File Size: {:.2} KB", kb)?;
        }
        writeln!(writer, "{}", RULE)?;
        Ok(())
    }

    fn write_outcome(&self, outcome: &FileOutcome, writer: &mut dyn WriteColor) -> Result<()> {
        writeln!(writer, "Preview (first {} rows):", outcome.preview.row_count())?;
        writeln!(writer, "{}", build_table(&outcome.preview))?;

        if let Some(removed) = outcome.duplicates_removed {
            write_colored(writer, Color::Green, "Duplicates Removed!")?;
            writeln!(writer, " ({} rows)", removed)?;
        }

        if let Some(fill) = &outcome.fill {
            write_colored(writer, Color::Green, "Missing Values have been Filled!")?;
            writeln!(writer)?;
            for column in &fill.filled {
                writeln!(
                    writer,
                    "  {}: {} cells → {}",
                    column.column,
                    column.cells_filled,
                    format_float(column.mean)
                )?;
            }
            for column in &fill.skipped {
                writeln!(writer, "  {}: no values to average, left missing", column)?;
            }
        }

        let names: Vec<_> = outcome.table.column_names().collect();
        writeln!(
            writer,
            "Columns: {} ({} rows)",
            if names.is_empty() { "(none)".to_string() } else { names.join(", ") },
            outcome.table.row_count()
        )?;

        match &outcome.chart {
            Some(ChartOutcome::Sample(sample)) => self.write_chart(sample, writer)?,
            Some(ChartOutcome::Unavailable(msg)) => {
                write_colored(writer, Color::Yellow, msg)?;
                writeln!(writer)?;
            }
            None => {}
        }

        if let Some(export) = &outcome.export {
            writeln!(
                writer,
                "Converted: {} ({}, {:.2} KB)",
                export.file_name,
                export.mime_type,
                export.bytes.len() as f64 / 1024.0
            )?;
        }

        writeln!(writer)?;
        Ok(())
    }

    fn write_chart(&self, sample: &ChartSample, writer: &mut dyn WriteColor) -> Result<()> {
        writeln!(
            writer,
            "Bar chart: █ {}  ▒ {}",
            sample.columns[0], sample.columns[1]
        )?;

        let max = sample.max_magnitude();
        let label_width = sample.len().saturating_sub(1).to_string().len();

        for (i, pair) in sample.values.iter().take(self.max_chart_rows).enumerate() {
            for (series, value) in pair.iter().enumerate() {
                let label = if series == 0 { i.to_string() } else { String::new() };
                let glyph = if series == 0 { "█" } else { "▒" };
                writeln!(
                    writer,
                    "  {:>width$} │{}",
                    label,
                    self.bar(*value, max, glyph),
                    width = label_width
                )?;
            }
        }

        if sample.len() > self.max_chart_rows {
            writeln!(writer, "  … {} more rows", sample.len() - self.max_chart_rows)?;
        }
        Ok(())
    }

    fn bar(&self, value: Option<f64>, max: f64, glyph: &str) -> String {
        let Some(v) = value else {
            return " (missing)".to_string();
        };

        let len = if max > 0.0 && v.is_finite() {
            ((v.abs() / max) * self.bar_width as f64).round() as usize
        } else {
            0
        };
        let sign = if v < 0.0 { "-" } else { "" };
        format!("{}{} {}", sign, glyph.repeat(len), format_float(v))
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TerminalOutput {
    fn render(&self, report: &BatchReport, writer: &mut dyn WriteColor) -> Result<()> {
        for file in &report.files {
            match &file.result {
                Ok(outcome) => {
                    self.write_header(writer, file, Some(outcome.size_kb()))?;
                    self.write_outcome(outcome, writer)?;
                }
                Err(e) => {
                    self.write_header(writer, file, None)?;
                    write_colored(writer, Color::Red, &format!("Error: {}", e))?;
                    writeln!(writer)?;
                    writeln!(writer)?;
                }
            }
        }

        let failed = report.failed();
        if failed == 0 {
            write_colored(writer, Color::Green, "All files processed successfully!")?;
        } else {
            write_colored(
                writer,
                Color::Yellow,
                &format!("{} of {} files could not be processed", failed, report.files.len()),
            )?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

fn write_colored(writer: &mut dyn WriteColor, color: Color, text: &str) -> Result<()> {
    writer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(writer, "{}", text)?;
    writer.reset()?;
    Ok(())
}

/// Render a table preview with tabled
fn build_table(table: &Table) -> String {
    if table.column_count() == 0 {
        return format!("(no columns, {} rows)", table.row_count());
    }

    let mut builder = Builder::default();
    builder.push_record(table.column_names().map(String::from));
    for row in &table.rows {
        builder.push_record(row.cells.iter().map(|c| c.display().into_owned()));
    }

    let mut rendered = builder.build();
    rendered.with(Style::modern());
    rendered.to_string()
}
