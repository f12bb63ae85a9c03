//! In-memory cell grid for a single worksheet

use super::columns::{column_label, CellRef};
use crate::error::{SheetError, SheetResult};
use crate::types::CellValue;
use std::collections::BTreeMap;

/// Sparse cell grid addressed by column label and 1-based row.
///
/// Keys are `(row, column index)` so iteration runs row by row, left to
/// right. Empty values are never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    cells: BTreeMap<(u32, usize), CellValue>,
}

impl SheetGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value with its own type
    pub fn set_value(&mut self, cell: &CellRef, value: CellValue) -> SheetResult<()> {
        let key = Self::key(cell)?;
        if value.is_empty() {
            self.cells.remove(&key);
        } else {
            self.cells.insert(key, value);
        }
        Ok(())
    }

    /// Store the textual form of `value`, whatever its type.
    ///
    /// Leading zeros, long digit strings and date-like text survive as typed.
    /// An empty value still produces an (empty) text cell.
    pub fn set_text_explicit(&mut self, cell: &CellRef, value: &CellValue) -> SheetResult<()> {
        let key = Self::key(cell)?;
        self.cells.insert(key, CellValue::Text(value.to_text()));
        Ok(())
    }

    pub fn get(&self, cell: &CellRef) -> Option<&CellValue> {
        let key = Self::key(cell).ok()?;
        self.cells.get(&key)
    }

    /// Value at a 0-based column index and 1-based row
    pub fn value_at(&self, column: usize, row: u32) -> Option<&CellValue> {
        self.cells.get(&(row, column))
    }

    /// Highest 1-based row holding a value, 0 for an empty grid
    pub fn highest_row(&self) -> u32 {
        self.cells.keys().next_back().map(|(row, _)| *row).unwrap_or(0)
    }

    /// Number of columns up to the right-most one holding a value
    pub fn column_count(&self) -> usize {
        self.cells
            .keys()
            .map(|(_, col)| col + 1)
            .max()
            .unwrap_or(0)
    }

    /// Label of the right-most populated column, `None` for an empty grid
    pub fn highest_column(&self) -> Option<String> {
        match self.column_count() {
            0 => None,
            n => Some(column_label(n - 1)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// All stored cells as `(row, column index, value)`, row-major
    pub fn cells(&self) -> impl Iterator<Item = (u32, usize, &CellValue)> {
        self.cells.iter().map(|((row, col), value)| (*row, *col, value))
    }

    /// One row as `width` values, missing cells filled with `Empty`
    pub fn row_values(&self, row: u32, width: usize) -> Vec<CellValue> {
        (0..width)
            .map(|col| self.value_at(col, row).cloned().unwrap_or_default())
            .collect()
    }

    fn key(cell: &CellRef) -> SheetResult<(u32, usize)> {
        if cell.row == 0 {
            return Err(SheetError::Config(format!(
                "row numbers start at 1, got cell {}",
                cell
            )));
        }
        let col = cell.column_index().ok_or_else(|| {
            SheetError::Config(format!("invalid column label '{}'", cell.column))
        })?;
        Ok((cell.row, col))
    }
}
