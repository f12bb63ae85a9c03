//! Row importer: .xls/.xlsx → records keyed by caller-chosen names

use super::codec::{self, SpreadsheetFormat};
use super::source::ImportSource;
use crate::error::{SheetError, SheetResult};
use crate::types::{CellValue, FieldMap, Record};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Header row number when no start line is configured
pub const DEFAULT_START_READ_LINE: u32 = 1;

/// Receives imported rows in fixed-size batches.
///
/// Runs inline on the importing thread. Returning an error stops the import:
/// rows after the failing batch are never read, and batches already
/// delivered stay delivered.
pub trait RowBatchSink {
    fn deliver(&mut self, batch: Vec<Record>) -> anyhow::Result<()>;
}

impl<F> RowBatchSink for F
where
    F: FnMut(Vec<Record>) -> anyhow::Result<()>,
{
    fn deliver(&mut self, batch: Vec<Record>) -> anyhow::Result<()> {
        self(batch)
    }
}

/// What to do when two mapped header cells carry the same text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateHeaders {
    /// The right-most column wins; earlier columns with that header are lost
    #[default]
    LastWins,
    /// Fail with `SheetError::DuplicateHeader`
    Reject,
}

struct Chunking {
    size: usize,
    sink: Box<dyn RowBatchSink>,
}

/// Reads the first worksheet of a workbook into records.
///
/// The row at `start_read_line` is the header; every row below it is paired
/// with the header by column position and renamed through the field map.
pub struct RowImporter {
    source: ImportSource,
    fields: FieldMap,
    start_read_line: u32,
    chunking: Option<Chunking>,
    duplicates: DuplicateHeaders,
}

impl fmt::Debug for RowImporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowImporter")
            .field("source", &self.source.name())
            .field("fields", &self.fields)
            .field("start_read_line", &self.start_read_line)
            .field("chunk_size", &self.chunking.as_ref().map(|c| c.size))
            .field("duplicates", &self.duplicates)
            .finish()
    }
}

/// Counters for one import run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ImportStats {
    kept: usize,
    dropped: usize,
    batches: usize,
}

impl RowImporter {
    pub fn new(source: impl Into<ImportSource>, fields: FieldMap) -> SheetResult<Self> {
        let source = source.into();
        if source.is_unset() {
            return Err(SheetError::Config("file path is not set".to_string()));
        }
        Ok(Self {
            source,
            fields,
            start_read_line: DEFAULT_START_READ_LINE,
            chunking: None,
            duplicates: DuplicateHeaders::default(),
        })
    }

    /// 1-based row holding the header; data starts on the row after it
    pub fn with_start_read_line(mut self, line: u32) -> SheetResult<Self> {
        if line == 0 {
            return Err(SheetError::Config(
                "start_read_line must be at least 1".to_string(),
            ));
        }
        self.start_read_line = line;
        Ok(self)
    }

    /// Deliver rows to `sink` in batches of `size` instead of returning them
    pub fn with_chunks(
        mut self,
        size: usize,
        sink: impl RowBatchSink + 'static,
    ) -> SheetResult<Self> {
        if size == 0 {
            return Err(SheetError::Config(
                "chunk size must be at least 1".to_string(),
            ));
        }
        self.chunking = Some(Chunking {
            size,
            sink: Box::new(sink),
        });
        Ok(self)
    }

    pub fn with_duplicate_headers(mut self, policy: DuplicateHeaders) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn source(&self) -> &ImportSource {
        &self.source
    }

    pub fn start_read_line(&self) -> u32 {
        self.start_read_line
    }

    pub fn is_chunked(&self) -> bool {
        self.chunking.is_some()
    }

    /// Read every data row.
    ///
    /// Without chunking, returns all kept rows in sheet order. With chunking,
    /// rows go to the sink and the returned `Vec` is empty.
    pub fn read_rows(&mut self) -> SheetResult<Vec<Record>> {
        SpreadsheetFormat::detect(&self.source)?;
        if !self.source.exists() {
            return Err(SheetError::Config(format!(
                "file does not exist: {}",
                self.source.name()
            )));
        }

        let sheet = codec::load_first_sheet(&self.source)?;
        let grid = sheet.grid;
        let width = grid.column_count();
        let highest_row = grid.highest_row();

        let header: Vec<String> = grid
            .row_values(self.start_read_line, width)
            .iter()
            .map(CellValue::to_text)
            .collect();
        self.check_duplicates(&header)?;
        debug!(columns = width, rows = highest_row, header = ?header, "read header row");

        let mut stats = ImportStats::default();
        let mut buffer: Vec<Record> = Vec::new();

        for row in self.start_read_line.saturating_add(1)..=highest_row {
            let values = grid.row_values(row, width);
            let projected = self.project(&header, values);

            if is_blank(&projected) {
                stats.dropped += 1;
            } else {
                stats.kept += 1;
                buffer.push(projected);
            }

            if let Some(chunking) = self.chunking.as_mut() {
                if buffer.len() == chunking.size {
                    Self::flush(chunking, &mut buffer, &mut stats)?;
                }
            }
        }

        if let Some(chunking) = self.chunking.as_mut() {
            if !buffer.is_empty() {
                Self::flush(chunking, &mut buffer, &mut stats)?;
            }
        }

        info!(
            source = %self.source.name(),
            kept = stats.kept,
            dropped = stats.dropped,
            batches = stats.batches,
            "import finished"
        );
        Ok(buffer)
    }

    /// Pair values with header keys, then keep and rename mapped keys.
    ///
    /// A repeated header key takes the right-most column's value but keeps
    /// the position of its first column.
    fn project(&self, header: &[String], values: Vec<CellValue>) -> Record {
        let mut raw: IndexMap<&str, CellValue> = IndexMap::with_capacity(header.len());
        for (key, value) in header.iter().zip(values) {
            let value = match value {
                CellValue::Empty => CellValue::Text(String::new()),
                other => other,
            };
            raw.insert(key.as_str(), value);
        }

        let mut row = Record::new();
        for (raw_key, value) in raw {
            if raw_key.is_empty() {
                continue;
            }
            if let Some(out_key) = self.fields.get(raw_key) {
                row.insert(out_key.clone(), value);
            }
        }
        row
    }

    fn check_duplicates(&self, header: &[String]) -> SheetResult<()> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (idx, key) in header.iter().enumerate() {
            if key.is_empty() || !self.fields.contains_key(key) {
                continue;
            }
            if let Some(first) = seen.insert(key.as_str(), idx) {
                let message = format!(
                    "'{}' appears in columns {} and {}",
                    key,
                    super::column_label(first),
                    super::column_label(idx)
                );
                match self.duplicates {
                    DuplicateHeaders::Reject => return Err(SheetError::DuplicateHeader(message)),
                    DuplicateHeaders::LastWins => {
                        warn!("{}; keeping the right-most column", message)
                    }
                }
            }
        }
        Ok(())
    }

    fn flush(
        chunking: &mut Chunking,
        buffer: &mut Vec<Record>,
        stats: &mut ImportStats,
    ) -> SheetResult<()> {
        let batch = std::mem::take(buffer);
        debug!(size = batch.len(), batch = stats.batches + 1, "delivering row batch");
        chunking.sink.deliver(batch).map_err(SheetError::Handler)?;
        stats.batches += 1;
        Ok(())
    }
}

/// A row with no mapped keys, or only empty values, is not delivered
fn is_blank(row: &Record) -> bool {
    row.values().all(|value| match value {
        CellValue::Empty => true,
        CellValue::Text(s) => s.is_empty(),
        _ => false,
    })
}
