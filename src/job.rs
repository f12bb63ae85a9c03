//! Job files and record data files
//!
//! An export job names the header spec and optional template; an import job
//! names the field map and batching. Both are YAML. Record data is JSON or
//! YAML, picked by file extension.

use crate::error::{SheetError, SheetResult};
use crate::excel::{
    DuplicateHeaders, RowExporter, RowImporter, DEFAULT_START_READ_LINE, DEFAULT_START_WRITE_LINE,
};
use crate::types::{FieldMap, HeaderSpec, Record};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportJob {
    /// Display label → record field, in column order
    pub header: HeaderSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    #[serde(default = "default_start_write_line")]
    pub start_write_line: u32,
    /// Attachment base name; empty means a timestamp
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
}

/// Import configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJob {
    /// Raw header text → output key
    pub fields: FieldMap,
    #[serde(default = "default_start_read_line")]
    pub start_read_line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub duplicate_headers: DuplicateHeaders,
}

fn default_start_write_line() -> u32 {
    DEFAULT_START_WRITE_LINE
}

fn default_start_read_line() -> u32 {
    DEFAULT_START_READ_LINE
}

impl ExportJob {
    pub fn load(path: &Path) -> SheetResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Build an exporter for `records`.
    ///
    /// A relative template path is resolved against `base_dir`.
    pub fn exporter(&self, records: Vec<Record>, base_dir: &Path) -> SheetResult<RowExporter> {
        let mut exporter = RowExporter::new(self.header.clone(), records)
            .with_start_write_line(self.start_write_line)?;
        if let Some(template) = &self.template {
            exporter = exporter.with_template(resolve(base_dir, template));
        }
        if let Some(sheet_name) = &self.sheet_name {
            exporter = exporter.with_sheet_name(sheet_name.clone());
        }
        Ok(exporter)
    }
}

impl ImportJob {
    pub fn load(path: &Path) -> SheetResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Build an importer for `input`; batching is wired up by the caller
    pub fn importer(&self, input: &Path) -> SheetResult<RowImporter> {
        Ok(RowImporter::new(input, self.fields.clone())?
            .with_start_read_line(self.start_read_line)?
            .with_duplicate_headers(self.duplicate_headers))
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Record file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> SheetResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(DataFormat::Json),
            Some("yaml") | Some("yml") => Ok(DataFormat::Yaml),
            _ => Err(SheetError::Config(format!(
                "record file must be .json, .yaml or .yml: {}",
                path.display()
            ))),
        }
    }
}

/// Read an array of records from a JSON or YAML file
pub fn load_records(path: &Path) -> SheetResult<Vec<Record>> {
    let format = DataFormat::from_path(path)?;
    let content = fs::read_to_string(path)?;
    match format {
        DataFormat::Json => Ok(serde_json::from_str(&content)?),
        DataFormat::Yaml => Ok(serde_yaml::from_str(&content)?),
    }
}

/// Write records to a JSON or YAML file
pub fn write_records(path: &Path, records: &[Record]) -> SheetResult<()> {
    let content = match DataFormat::from_path(path)? {
        DataFormat::Json => serde_json::to_string_pretty(records)?,
        DataFormat::Yaml => serde_yaml::to_string(records)?,
    };
    fs::write(path, content)?;
    Ok(())
}
