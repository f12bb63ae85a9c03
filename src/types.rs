use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

//==============================================================================
// Cell values
//==============================================================================

/// A single scalar held by a record field or a grid cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// No value (`null` in JSON/YAML)
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Textual form written by the exporter.
    ///
    /// Integers print without a decimal point and integral floats drop the
    /// trailing `.0`, so `7` and `7.0` both become `"7"`.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "Empty",
            CellValue::Bool(_) => "Bool",
            CellValue::Int(_) => "Int",
            CellValue::Float(_) => "Float",
            CellValue::Text(_) => "Text",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

//==============================================================================
// Records and mappings
//==============================================================================

/// One row of application data: field key → value, in insertion order
pub type Record = IndexMap<String, CellValue>;

/// Export header: display label → source field key.
///
/// Iteration order is column order. Labels are map keys, so a label can
/// only appear once.
pub type HeaderSpec = IndexMap<String, String>;

/// Import mapping: raw header cell text → output key.
///
/// Header cells missing from the map are dropped from every row.
pub type FieldMap = IndexMap<String, String>;
