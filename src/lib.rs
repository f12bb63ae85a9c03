//! Sheetport - bulk record import/export against spreadsheets
//!
//! Maps between in-memory records (field name → value) and the first
//! worksheet of an `.xls`/`.xlsx` workbook.
//!
//! # Features
//!
//! - Export records under an ordered header spec, every cell written as text
//! - Export on top of a template whose header row is already in place
//! - Import rows renamed through a field map, unmapped columns dropped
//! - Batched import delivery through a `RowBatchSink`
//! - HTTP server streaming exports as attachments
//!
//! # Example
//!
//! ```no_run
//! use sheetport::excel::{RowExporter, RowImporter};
//! use sheetport::types::{FieldMap, HeaderSpec, Record};
//! use std::path::Path;
//!
//! let mut header = HeaderSpec::new();
//! header.insert("Name".to_string(), "name".to_string());
//!
//! let mut record = Record::new();
//! record.insert("name".to_string(), "Ada".into());
//!
//! RowExporter::new(header, vec![record]).export_to_path(Path::new("people.xlsx"))?;
//!
//! let mut fields = FieldMap::new();
//! fields.insert("Name".to_string(), "full_name".to_string());
//! let rows = RowImporter::new("people.xlsx", fields)?.read_rows()?;
//! println!("Imported {} rows", rows.len());
//! # Ok::<(), sheetport::error::SheetError>(())
//! ```

pub mod api;
pub mod cli;
pub mod error;
pub mod excel;
pub mod job;
pub mod types;

// Re-export commonly used types
pub use error::{SheetError, SheetResult};
pub use types::{CellValue, FieldMap, HeaderSpec, Record};
