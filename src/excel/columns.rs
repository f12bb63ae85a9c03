//! Spreadsheet column addressing (A, B, ..., Z, AA, AB, ...)

use crate::error::{SheetError, SheetResult};
use std::fmt;

const LETTERS: usize = 26;

/// Generate `26 * level` column labels in sheet order.
///
/// The first 26 are `A..Z`. Each further level appends one run of 26
/// labels formed by prefixing the next label of the sequence (`A`, `B`, ...)
/// to every single letter, so level 2 ends at `AZ` and level 3 at `BZ`.
pub fn generate_columns(level: usize) -> SheetResult<Vec<String>> {
    if level == 0 {
        return Err(SheetError::Config(
            "column level must be at least 1".to_string(),
        ));
    }

    let mut words: Vec<String> = (b'A'..=b'Z').map(|c| (c as char).to_string()).collect();
    words.reserve(LETTERS * (level - 1));

    for prefix_idx in 0..level - 1 {
        for letter_idx in 0..LETTERS {
            let label = format!("{}{}", words[prefix_idx], words[letter_idx]);
            words.push(label);
        }
    }

    Ok(words)
}

/// Convert a 0-based column index to its label (0→A, 25→Z, 26→AA, 702→AAA)
pub fn column_label(index: usize) -> String {
    let mut result = String::new();
    let mut idx = index;

    loop {
        let remainder = idx % LETTERS;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < LETTERS {
            break;
        }
        idx = idx / LETTERS - 1;
    }

    result
}

/// Convert a column label back to its 0-based index (A→0, AA→26).
///
/// Returns `None` for an empty label or one with non-letter characters.
pub fn column_index(label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }

    let mut result: usize = 0;
    for c in label.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let val = (c.to_ascii_uppercase() as u8 - b'A' + 1) as usize;
        result = result.checked_mul(LETTERS)?.checked_add(val)?;
    }

    Some(result - 1)
}

/// Exactly `count` labels, starting at `A`
pub fn column_labels(count: usize) -> Vec<String> {
    (0..count).map(column_label).collect()
}

/// A cell address: column label plus 1-based row number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub column: String,
    pub row: u32,
}

impl CellRef {
    pub fn new(column: impl Into<String>, row: u32) -> Self {
        Self {
            column: column.into(),
            row,
        }
    }

    /// Parse an `A1`-style reference. Row 0 is rejected.
    pub fn parse(reference: &str) -> Option<Self> {
        let split = reference.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = reference.split_at(split);
        column_index(letters)?;
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self::new(letters.to_ascii_uppercase(), row))
    }

    /// 0-based column index
    pub fn column_index(&self) -> Option<usize> {
        column_index(&self.column)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}
