//! Workbook codec: calamine for reading, rust_xlsxwriter for writing

use super::grid::SheetGrid;
use super::source::{ImportSource, SourceReader};
use crate::error::{SheetError, SheetResult};
use crate::types::CellValue;
use calamine::{Data, Range, Reader, Xls, Xlsx};
use rust_xlsxwriter::Workbook;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;

/// Excel's column limit (XFD)
const MAX_COLUMNS: usize = 16_384;

/// Excel's row limit
pub const MAX_ROWS: u32 = 1_048_576;

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// MIME type sent with exported workbooks
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The two readable spreadsheet formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Legacy BIFF8 workbook (.xls)
    Xls,
    /// Office Open XML workbook (.xlsx)
    Xlsx,
}

impl SpreadsheetFormat {
    /// Resolve a format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> SheetResult<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xls" => Ok(SpreadsheetFormat::Xls),
            "xlsx" => Ok(SpreadsheetFormat::Xlsx),
            other => Err(SheetError::UnsupportedFormat(format!(
                "expected .xls or .xlsx, got '.{}'",
                other
            ))),
        }
    }

    /// Resolve a format from a source's file name
    pub fn detect(source: &ImportSource) -> SheetResult<Self> {
        match source.extension() {
            Some(ext) => Self::from_extension(&ext),
            None => Err(SheetError::UnsupportedFormat(format!(
                "'{}' has no file extension",
                source.name()
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SpreadsheetFormat::Xls => "xls",
            SpreadsheetFormat::Xlsx => "xlsx",
        }
    }
}

/// First worksheet of a loaded workbook
#[derive(Debug, Clone, Default)]
pub struct LoadedSheet {
    pub name: String,
    pub grid: SheetGrid,
}

/// Load sheet index 0 of a workbook.
///
/// A workbook without sheets loads as an empty grid.
pub fn load_first_sheet(source: &ImportSource) -> SheetResult<LoadedSheet> {
    let format = SpreadsheetFormat::detect(source)?;
    let reader = source.open()?;

    let sheet = match format {
        SpreadsheetFormat::Xls => read_first_sheet::<SourceReader, Xls<SourceReader>>(reader)?,
        SpreadsheetFormat::Xlsx => read_first_sheet::<SourceReader, Xlsx<SourceReader>>(reader)?,
    };

    debug!(
        source = %source.name(),
        sheet = %sheet.name,
        rows = sheet.grid.highest_row(),
        columns = sheet.grid.column_count(),
        "loaded worksheet"
    );
    Ok(sheet)
}

/// Load sheet index 0 of a workbook on disk
pub fn load_path(path: &Path) -> SheetResult<LoadedSheet> {
    load_first_sheet(&ImportSource::from(path))
}

fn read_first_sheet<RS, R>(reader: RS) -> SheetResult<LoadedSheet>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let mut workbook = R::new(reader).map_err(|e| SheetError::Load(e.to_string()))?;

    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| SheetError::Load(e.to_string()))?,
        None => {
            return Ok(LoadedSheet {
                name,
                grid: SheetGrid::new(),
            })
        }
    };

    Ok(LoadedSheet {
        name,
        grid: grid_from_range(&range)?,
    })
}

fn grid_from_range(range: &Range<Data>) -> SheetResult<SheetGrid> {
    let mut grid = SheetGrid::new();
    let Some((start_row, start_col)) = range.start() else {
        return Ok(grid);
    };

    for (row, col, data) in range.cells() {
        let value = cell_from_data(data);
        if value.is_empty() {
            continue;
        }
        let cell = super::CellRef::new(
            super::column_label(start_col as usize + col),
            start_row + row as u32 + 1,
        );
        grid.set_value(&cell, value)?;
    }

    Ok(grid)
}

/// Map a calamine cell to the raw value a spreadsheet stores.
///
/// Date/time cells become their serial number.
pub fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// Build an xlsx workbook holding `grid` as its only worksheet
pub fn grid_to_workbook(grid: &SheetGrid, sheet_name: &str) -> SheetResult<Workbook> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (row, col, value) in grid.cells() {
        if col >= MAX_COLUMNS {
            return Err(SheetError::Export(format!(
                "column {} exceeds the {} column limit",
                super::column_label(col),
                MAX_COLUMNS
            )));
        }
        let (row, col) = (row - 1, col as u16);
        match value {
            CellValue::Empty => {}
            CellValue::Text(s) if s.is_empty() => {}
            CellValue::Text(s) => {
                worksheet.write_string(row, col, s)?;
            }
            CellValue::Int(i) => {
                worksheet.write_number(row, col, *i as f64)?;
            }
            CellValue::Float(f) => {
                worksheet.write_number(row, col, *f)?;
            }
            CellValue::Bool(b) => {
                worksheet.write_boolean(row, col, *b)?;
            }
        }
    }

    Ok(workbook)
}

/// Serialize `grid` to xlsx bytes
pub fn grid_to_bytes(grid: &SheetGrid, sheet_name: &str) -> SheetResult<Vec<u8>> {
    let mut workbook = grid_to_workbook(grid, sheet_name)?;
    Ok(workbook.save_to_buffer()?)
}

/// Write `grid` to an xlsx file
pub fn save_grid(grid: &SheetGrid, sheet_name: &str, path: &Path) -> SheetResult<()> {
    let mut workbook = grid_to_workbook(grid, sheet_name)?;
    workbook
        .save(path)
        .map_err(|e| SheetError::Export(format!("Failed to save {}: {}", path.display(), e)))
}
