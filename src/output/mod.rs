//! Output formatting for batch results

mod json;
mod terminal;

use anyhow::Result;
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::config::ReportFormat;
use crate::session::BatchReport;

pub use json::JsonOutput;
pub use terminal::TerminalOutput;

/// Trait for report formatters
pub trait OutputFormatter {
    /// Render a batch report to a writer
    fn render(&self, report: &BatchReport, writer: &mut dyn WriteColor) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create an output formatter based on format type
    pub fn create(format: ReportFormat) -> Box<dyn OutputFormatter> {
        match format {
            ReportFormat::Terminal => Box::new(TerminalOutput::new()),
            ReportFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}

/// Render a batch report to stdout
pub fn render_to_stdout(report: &BatchReport, format: ReportFormat) -> Result<()> {
    let formatter = OutputFactory::create(format);
    let choice = match format {
        ReportFormat::Terminal => ColorChoice::Auto,
        ReportFormat::Json => ColorChoice::Never,
    };
    let mut stdout = StandardStream::stdout(choice);
    formatter.render(report, &mut stdout)
}
