//! Spreadsheet import/export for tabular records
//!
//! This module provides both directions between records and a sheet:
//! - Export: records + header spec → .xlsx (optionally on top of a template)
//! - Import: .xls/.xlsx → records, renamed through a field map, optionally in batches

pub mod codec;
mod columns;
mod exporter;
mod grid;
mod importer;
mod source;

pub use codec::{LoadedSheet, SpreadsheetFormat};
pub use columns::{column_index, column_label, column_labels, generate_columns, CellRef};
pub use exporter::{Download, RowExporter, DEFAULT_START_WRITE_LINE};
pub use grid::SheetGrid;
pub use importer::{DuplicateHeaders, RowBatchSink, RowImporter, DEFAULT_START_READ_LINE};
pub use source::{ImportSource, SourceReader};
