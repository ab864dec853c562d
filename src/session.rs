//! Session orchestration: per-file caching and batch processing

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHasher};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chart::{sample_for_chart, ChartSample};
use crate::clean::{fill_missing_numeric, remove_duplicates, FillSummary};
use crate::config::Operations;
use crate::encode::{encode, EncodedFile};
use crate::error::{Result, SweepError};
use crate::model::Table;
use crate::parser::ParserFactory;

/// An uploaded file: its declared name and raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its file name as the declared name
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| SweepError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Size in kilobytes
    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}

/// Stable identifier of an upload within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FileId(u64);

impl FileId {
    fn compute(slot: usize, name: &str, bytes: &[u8]) -> Self {
        let mut hasher = FxHasher::default();
        slot.hash(&mut hasher);
        name.hash(&mut hasher);
        bytes.hash(&mut hasher);
        FileId(hasher.finish())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Whether a chart could be drawn for a file
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Sample(ChartSample),
    /// Not enough numeric columns; holds the message to show instead
    Unavailable(String),
}

/// Everything produced for one file by one interaction
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub id: FileId,
    pub name: String,
    pub size_bytes: usize,
    /// First rows of the table as loaded, before any cleaning
    pub preview: Table,
    /// The table after all requested operations
    pub table: Table,
    pub duplicates_removed: Option<usize>,
    pub fill: Option<FillSummary>,
    pub chart: Option<ChartOutcome>,
    pub export: Option<EncodedFile>,
}

impl FileOutcome {
    /// Size in kilobytes
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Result for one file of a batch
#[derive(Debug)]
pub struct FileReport {
    pub id: FileId,
    pub name: String,
    pub result: Result<FileOutcome>,
}

/// Results for every file of a batch, in upload order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// Number of files that could not be processed
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.result.is_err()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Record a file that failed before it reached a session
    pub fn push_failure(&mut self, name: impl Into<String>, error: SweepError) {
        let name = name.into();
        let id = FileId::compute(self.files.len(), &name, &[]);
        warn!(file = %name, error = %error, "failed to process file");
        self.files.push(FileReport {
            id,
            name,
            result: Err(error),
        });
    }

    /// Whether any file produced a converted output
    pub fn has_exports(&self) -> bool {
        self.files
            .iter()
            .any(|f| matches!(&f.result, Ok(outcome) if outcome.export.is_some()))
    }

    /// Write every converted file into `out_dir`.
    ///
    /// An export that cannot be written, that would replace one of `inputs`,
    /// or whose file name was already written in this batch becomes the
    /// failure of its own file; the others are still written. Returns the
    /// number of files written.
    pub fn write_exports(&mut self, out_dir: &Path, inputs: &[PathBuf]) -> usize {
        let inputs: Vec<PathBuf> = inputs.iter().filter_map(|p| p.canonicalize().ok()).collect();
        let mut written: FxHashMap<PathBuf, String> = FxHashMap::default();

        for file in &mut self.files {
            let result = match &file.result {
                Ok(FileOutcome {
                    export: Some(export),
                    ..
                }) => write_export(export, &file.name, out_dir, &inputs, &mut written),
                _ => continue,
            };

            if let Err(e) = result {
                warn!(file = %file.name, error = %e, "failed to write converted file");
                file.result = Err(e);
            }
        }

        written.len()
    }
}

fn write_export(
    export: &EncodedFile,
    name: &str,
    out_dir: &Path,
    inputs: &[PathBuf],
    written: &mut FxHashMap<PathBuf, String>,
) -> Result<()> {
    let target = out_dir.join(&export.file_name);

    if let Some(first) = written.get(&target) {
        return Err(SweepError::DuplicateTarget {
            path: target,
            first: first.clone(),
        });
    }

    if target.canonicalize().is_ok_and(|t| inputs.contains(&t)) {
        return Err(SweepError::OverwritesInput { path: target });
    }

    std::fs::write(&target, &export.bytes).map_err(|source| SweepError::Write {
        path: target.clone(),
        source,
    })?;
    info!(path = %target.display(), mime = export.mime_type, "wrote converted file");

    written.insert(target, name.to_string());
    Ok(())
}

struct Slot {
    file: UploadedFile,
    base: Option<Table>,
}

/// Holds the uploads of one session and the tables parsed from them.
///
/// Each [`Session::process`] call starts from a fresh copy of the parsed
/// table, so interactions against the same upload never see each other's
/// changes.
pub struct Session {
    uploads: IndexMap<FileId, Slot>,
    factory: ParserFactory,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            uploads: IndexMap::new(),
            factory: ParserFactory::new(),
        }
    }

    /// Register an upload and return its id
    pub fn upload(&mut self, file: UploadedFile) -> FileId {
        let id = FileId::compute(self.uploads.len(), &file.name, &file.bytes);
        debug!(%id, file = %file.name, bytes = file.size(), "registered upload");
        self.uploads.insert(id, Slot { file, base: None });
        id
    }

    /// Ids of all uploads, in upload order
    pub fn ids(&self) -> impl Iterator<Item = FileId> + '_ {
        self.uploads.keys().copied()
    }

    pub fn file(&self, id: FileId) -> Option<&UploadedFile> {
        self.uploads.get(&id).map(|slot| &slot.file)
    }

    pub fn len(&self) -> usize {
        self.uploads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }

    /// Parsed table of an upload, loading it on first use
    pub fn table(&mut self, id: FileId) -> Result<&Table> {
        let slot = self.uploads.get_mut(&id).ok_or(SweepError::UnknownFile(id))?;

        let table = match slot.base.take() {
            Some(table) => table,
            None => self.factory.load(&slot.file.bytes, &slot.file.name)?,
        };

        Ok(&*slot.base.insert(table))
    }

    /// Run the requested operations against one upload
    pub fn process(&mut self, id: FileId, ops: &Operations) -> Result<FileOutcome> {
        let mut table = self.table(id)?.clone();
        let file = self.file(id).ok_or(SweepError::UnknownFile(id))?;
        let name = file.name.clone();
        let size_bytes = file.size();

        let preview = table.head(ops.preview_rows);

        let duplicates_removed = ops
            .remove_duplicates
            .then(|| remove_duplicates(&mut table));

        let fill = if ops.fill_missing {
            Some(fill_missing_numeric(&mut table, ops.undefined_mean)?)
        } else {
            None
        };

        if let Some(columns) = &ops.columns {
            table.project(columns.as_slice());
        }

        let chart = ops.chart.then(|| match sample_for_chart(&table) {
            Ok(sample) => ChartOutcome::Sample(sample),
            Err(e) => ChartOutcome::Unavailable(e.to_string()),
        });

        let export = match ops.export {
            Some(format) => Some(encode(&table, format, &name)?),
            None => None,
        };

        info!(
            file = %name,
            rows = table.row_count(),
            columns = table.column_count(),
            "processed file"
        );

        Ok(FileOutcome {
            id,
            name,
            size_bytes,
            preview,
            table,
            duplicates_removed,
            fill,
            chart,
            export,
        })
    }

    /// Process every upload in order.
    ///
    /// A failure is recorded against its file and never stops the others.
    pub fn process_all(&mut self, ops: &Operations) -> BatchReport {
        let ids: Vec<FileId> = self.ids().collect();
        let mut report = BatchReport::default();

        for id in ids {
            report.files.push(self.report(id, ops));
        }

        report
    }

    /// Process one upload, capturing a failure in the returned entry
    pub fn report(&mut self, id: FileId, ops: &Operations) -> FileReport {
        let name = self
            .file(id)
            .map(|f| f.name.clone())
            .unwrap_or_default();
        let result = self.process(id, ops);

        if let Err(e) = &result {
            warn!(file = %name, error = %e, "failed to process file");
        }

        FileReport { id, name, result }
    }
}
