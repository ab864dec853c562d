//! JSON output format

use anyhow::Result;
use serde::Serialize;
use termcolor::WriteColor;

use crate::clean::FillSummary;
use crate::session::{BatchReport, ChartOutcome, FileReport};

use super::OutputFormatter;

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonBatch<'a> {
    processed: usize,
    failed: usize,
    files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    id: String,
    name: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_kb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duplicates_removed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fill: Option<&'a FillSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart: Option<JsonChart<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<JsonExport<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonChart<'a> {
    Columns { columns: &'a [String; 2], rows: usize },
    Unavailable { unavailable: &'a str },
}

#[derive(Serialize)]
struct JsonExport<'a> {
    file_name: &'a str,
    mime_type: &'a str,
    bytes: usize,
}

fn file_to_json(file: &FileReport) -> JsonFile<'_> {
    let mut json = JsonFile {
        id: file.id.to_string(),
        name: &file.name,
        status: "ok",
        error: None,
        size_kb: None,
        rows: None,
        columns: None,
        duplicates_removed: None,
        fill: None,
        chart: None,
        export: None,
    };

    match &file.result {
        Ok(outcome) => {
            json.size_kb = Some((outcome.size_kb() * 100.0).round() / 100.0);
            json.rows = Some(outcome.table.row_count());
            json.columns = Some(outcome.table.column_names().collect());
            json.duplicates_removed = outcome.duplicates_removed;
            json.fill = outcome.fill.as_ref();
            json.chart = outcome.chart.as_ref().map(|chart| match chart {
                ChartOutcome::Sample(sample) => JsonChart::Columns {
                    columns: &sample.columns,
                    rows: sample.len(),
                },
                ChartOutcome::Unavailable(msg) => JsonChart::Unavailable { unavailable: msg },
            });
            json.export = outcome.export.as_ref().map(|e| JsonExport {
                file_name: &e.file_name,
                mime_type: e.mime_type,
                bytes: e.bytes.len(),
            });
        }
        Err(e) => {
            json.status = "error";
            json.error = Some(e.to_string());
        }
    }

    json
}

impl OutputFormatter for JsonOutput {
    fn render(&self, report: &BatchReport, writer: &mut dyn WriteColor) -> Result<()> {
        let failed = report.failed();
        let output = JsonBatch {
            processed: report.files.len() - failed,
            failed,
            files: report.files.iter().map(file_to_json).collect(),
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &output)?;
        } else {
            serde_json::to_writer(&mut *writer, &output)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportFormat, Operations};
    use crate::session::{Session, UploadedFile};
    use termcolor::Buffer;

    #[test]
    fn test_json_report() {
        let mut session = Session::new();
        session.upload(UploadedFile::new("a.csv", b"x,y\n1,\n3,4\n".to_vec()));
        session.upload(UploadedFile::new("b.txt", b"x".to_vec()));

        let ops = Operations::new()
            .with_fill_missing(true)
            .with_chart(true)
            .with_export(ExportFormat::Excel);
        let report = session.process_all(&ops);

        let mut buffer = Buffer::no_color();
        JsonOutput::compact().render(&report, &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(buffer.as_slice()).unwrap();

        assert_eq!(value["processed"], 1);
        assert_eq!(value["failed"], 1);

        let ok = &value["files"][0];
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["rows"], 2);
        assert_eq!(ok["columns"], serde_json::json!(["x", "y"]));
        assert_eq!(ok["fill"]["filled"][0]["column"], "y");
        assert_eq!(ok["fill"]["filled"][0]["mean"], 4.0);
        assert_eq!(ok["chart"]["columns"], serde_json::json!(["x", "y"]));
        assert_eq!(ok["export"]["file_name"], "a.xlsx");

        let bad = &value["files"][1];
        assert_eq!(bad["status"], "error");
        assert_eq!(bad["error"], "Unsupported file type: .txt");
        assert!(bad.get("rows").is_none());
    }
}
