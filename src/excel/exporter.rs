//! Row exporter: records → header row + text data rows

use super::codec::{self, DEFAULT_SHEET_NAME, MAX_ROWS, XLSX_MIME};
use super::columns::{column_labels, CellRef};
use super::grid::SheetGrid;
use crate::error::{SheetError, SheetResult};
use crate::types::{CellValue, HeaderSpec, Record};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// First data row when no start line is configured (row 1 holds the header)
pub const DEFAULT_START_WRITE_LINE: u32 = 2;

/// Exports records under a header spec.
///
/// Every data cell is written as text, so codes such as `007` keep their
/// leading zeros.
#[derive(Debug, Clone)]
pub struct RowExporter {
    header: HeaderSpec,
    records: Vec<Record>,
    template: Option<PathBuf>,
    start_write_line: u32,
    sheet_name: Option<String>,
}

/// A finished export ready to be streamed to a client
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl RowExporter {
    pub fn new(header: HeaderSpec, records: Vec<Record>) -> Self {
        Self {
            header,
            records,
            template: None,
            start_write_line: DEFAULT_START_WRITE_LINE,
            sheet_name: None,
        }
    }

    /// Start from an existing workbook whose header row already matches the
    /// header spec's column order. The header row is then not written.
    ///
    /// Only the first sheet's cell values are carried over; styling, column
    /// widths and merged cells are not.
    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Row number (1-based) of the first data row; must be at least 2 and
    /// within the sheet's row limit
    pub fn with_start_write_line(mut self, line: u32) -> SheetResult<Self> {
        if line <= 1 {
            return Err(SheetError::Config(format!(
                "start_write_line must be at least 2, got {}",
                line
            )));
        }
        if line > MAX_ROWS {
            return Err(SheetError::Config(format!(
                "start_write_line must not exceed {}, got {}",
                MAX_ROWS, line
            )));
        }
        self.start_write_line = line;
        Ok(self)
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }

    pub fn start_write_line(&self) -> u32 {
        self.start_write_line
    }

    pub fn template(&self) -> Option<&Path> {
        self.template.as_deref()
    }

    /// Populate the cell grid: header row (unless templated) then data rows
    pub fn build_sheet(&self) -> SheetResult<SheetGrid> {
        self.build().map(|(_, grid)| grid)
    }

    /// Build and write the workbook to `path` (.xlsx)
    pub fn export_to_path(&self, path: &Path) -> SheetResult<()> {
        let (sheet_name, grid) = self.build()?;
        codec::save_grid(&grid, &sheet_name, path)?;
        info!(
            path = %path.display(),
            records = self.records.len(),
            "exported workbook"
        );
        Ok(())
    }

    /// Build the workbook and return its .xlsx bytes
    pub fn export_to_bytes(&self) -> SheetResult<Vec<u8>> {
        let (sheet_name, grid) = self.build()?;
        codec::grid_to_bytes(&grid, &sheet_name)
    }

    /// Build the workbook as a named attachment.
    ///
    /// An empty `name` falls back to the current local time, `YYYYmmddHHMMSS`.
    pub fn download(&self, name: &str) -> SheetResult<Download> {
        let bytes = self.export_to_bytes()?;
        let file_name = format!("{}.xlsx", attachment_base_name(name));
        info!(file_name = %file_name, size = bytes.len(), "prepared download");
        Ok(Download {
            file_name,
            content_type: XLSX_MIME,
            bytes,
        })
    }

    fn build(&self) -> SheetResult<(String, SheetGrid)> {
        let (template_name, mut grid) = match &self.template {
            Some(path) => {
                let loaded = codec::load_path(path)?;
                (Some(loaded.name), loaded.grid)
            }
            None => (None, SheetGrid::new()),
        };

        let columns = column_labels(self.header.len());

        if self.template.is_none() {
            self.write_header(&mut grid, &columns)?;
        }
        self.write_data(&mut grid, &columns)?;

        debug!(
            columns = columns.len(),
            records = self.records.len(),
            start_write_line = self.start_write_line,
            templated = self.template.is_some(),
            "built export grid"
        );

        let sheet_name = self
            .sheet_name
            .clone()
            .or(template_name)
            .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());
        Ok((sheet_name, grid))
    }

    fn write_header(&self, grid: &mut SheetGrid, columns: &[String]) -> SheetResult<()> {
        for (column, label) in columns.iter().zip(self.header.keys()) {
            grid.set_value(&CellRef::new(column.as_str(), 1), CellValue::Text(label.clone()))?;
        }
        Ok(())
    }

    fn write_data(&self, grid: &mut SheetGrid, columns: &[String]) -> SheetResult<()> {
        let empty = CellValue::Empty;

        for (offset, record) in self.records.iter().enumerate() {
            let line = self.data_line(offset)?;
            for (column, field) in columns.iter().zip(self.header.values()) {
                let value = record.get(field).unwrap_or(&empty);
                grid.set_text_explicit(&CellRef::new(column.as_str(), line), value)?;
            }
        }

        Ok(())
    }

    /// Sheet row for the record at `offset`
    fn data_line(&self, offset: usize) -> SheetResult<u32> {
        u32::try_from(offset)
            .ok()
            .and_then(|offset| self.start_write_line.checked_add(offset))
            .filter(|line| *line <= MAX_ROWS)
            .ok_or_else(|| {
                SheetError::Export(format!(
                    "{} records starting at row {} exceed the {} row limit",
                    self.records.len(),
                    self.start_write_line,
                    MAX_ROWS
                ))
            })
    }
}

/// Base file name for an attachment; quotes and control characters are
/// dropped so the name fits in a `Content-Disposition` header
fn attachment_base_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> HeaderSpec {
        let mut header = HeaderSpec::new();
        header.insert("Name".to_string(), "name".to_string());
        header.insert("Code".to_string(), "code".to_string());
        header
    }

    fn record(name: &str, code: CellValue) -> Record {
        let mut record = Record::new();
        record.insert("name".to_string(), name.into());
        record.insert("code".to_string(), code);
        record
    }

    #[test]
    fn test_start_write_line_must_exceed_one() {
        let exporter = RowExporter::new(header(), vec![]);
        assert!(matches!(
            exporter.clone().with_start_write_line(1),
            Err(SheetError::Config(_))
        ));
        assert!(matches!(
            exporter.clone().with_start_write_line(0),
            Err(SheetError::Config(_))
        ));
        assert_eq!(exporter.with_start_write_line(2).unwrap().start_write_line(), 2);
    }

    #[test]
    fn test_start_write_line_within_row_limit() {
        let exporter = RowExporter::new(header(), vec![]);
        assert!(matches!(
            exporter.clone().with_start_write_line(u32::MAX),
            Err(SheetError::Config(_))
        ));
        assert!(matches!(
            exporter.clone().with_start_write_line(MAX_ROWS + 1),
            Err(SheetError::Config(_))
        ));
        assert_eq!(
            exporter.with_start_write_line(MAX_ROWS).unwrap().start_write_line(),
            MAX_ROWS
        );
    }

    #[test]
    fn test_records_past_last_row_fail() {
        let row = record("Ada", CellValue::Int(1));
        let result = RowExporter::new(header(), vec![row.clone(), row])
            .with_start_write_line(MAX_ROWS)
            .unwrap()
            .build_sheet();
        assert!(matches!(result, Err(SheetError::Export(_))));
    }

    #[test]
    fn test_last_row_is_writable() {
        let grid = RowExporter::new(header(), vec![record("Ada", CellValue::Int(1))])
            .with_start_write_line(MAX_ROWS)
            .unwrap()
            .build_sheet()
            .unwrap();
        assert_eq!(grid.highest_row(), MAX_ROWS);
    }

    #[test]
    fn test_zero_records_writes_only_header() {
        let grid = RowExporter::new(header(), vec![]).build_sheet().unwrap();
        assert_eq!(grid.highest_row(), 1);
        assert_eq!(grid.get(&CellRef::new("A", 1)), Some(&"Name".into()));
        assert_eq!(grid.get(&CellRef::new("B", 1)), Some(&"Code".into()));
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_data_written_as_text() {
        let records = vec![
            record("Ada", CellValue::Text("007".to_string())),
            record("Bob", CellValue::Int(42)),
        ];
        let grid = RowExporter::new(header(), records).build_sheet().unwrap();

        assert_eq!(grid.get(&CellRef::new("B", 2)), Some(&"007".into()));
        assert_eq!(grid.get(&CellRef::new("B", 3)), Some(&"42".into()));
        assert_eq!(grid.get(&CellRef::new("A", 3)), Some(&"Bob".into()));
    }

    #[test]
    fn test_missing_field_becomes_empty_text() {
        let mut partial = Record::new();
        partial.insert("name".to_string(), "Cy".into());
        let grid = RowExporter::new(header(), vec![partial]).build_sheet().unwrap();

        assert_eq!(
            grid.get(&CellRef::new("B", 2)),
            Some(&CellValue::Text(String::new()))
        );
    }

    #[test]
    fn test_start_write_line_offsets_data() {
        let grid = RowExporter::new(header(), vec![record("Ada", 1i64.into())])
            .with_start_write_line(4)
            .unwrap()
            .build_sheet()
            .unwrap();

        assert!(grid.get(&CellRef::new("A", 2)).is_none());
        assert_eq!(grid.get(&CellRef::new("A", 4)), Some(&"Ada".into()));
    }

    #[test]
    fn test_more_than_52_columns() {
        let mut header = HeaderSpec::new();
        let mut row = Record::new();
        for i in 0..60 {
            header.insert(format!("Label {}", i), format!("f{}", i));
            row.insert(format!("f{}", i), CellValue::Int(i));
        }
        let grid = RowExporter::new(header, vec![row]).build_sheet().unwrap();

        assert_eq!(grid.highest_column(), Some("BH".to_string()));
        assert_eq!(grid.get(&CellRef::new("BH", 1)), Some(&"Label 59".into()));
        assert_eq!(grid.get(&CellRef::new("BH", 2)), Some(&"59".into()));
    }

    #[test]
    fn test_attachment_base_name() {
        assert_eq!(attachment_base_name("report"), "report");
        assert_eq!(attachment_base_name("a\"b"), "ab");

        let stamp = attachment_base_name("");
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_download_names_attachment() {
        let download = RowExporter::new(header(), vec![])
            .download("users")
            .unwrap();
        assert_eq!(download.file_name, "users.xlsx");
        assert_eq!(download.content_type, XLSX_MIME);
        assert!(!download.bytes.is_empty());
    }
}
