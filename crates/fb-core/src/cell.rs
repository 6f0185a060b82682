//! Numeric cleaning for raw source cells.
//!
//! Source tables are hand-maintained spreadsheets: amounts carry `$` and
//! thousands separators, missing data is written as `-`, and some cells are
//! simply empty. Cleaning never fails. Anything that is not a recognizable
//! number becomes `0`, the same value a missing cell gets ("no allocation").
//!
//! Decimal amounts are truncated toward zero to whole units, so
//! `"12.50"` cleans to `12` and `"-3.99"` to `-3`.

use serde::{Deserialize, Serialize};

/// A single cell as read from a wide source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawCell {
    /// Empty cell
    Missing,
    /// Cell text, exactly as it appeared in the source
    Text(String),
    /// Natively typed integer
    Integer(i64),
    /// Natively typed floating point number
    Decimal(f64),
}

impl RawCell {
    /// Build a cell from optional text, mapping `None` and blank text to
    /// [`RawCell::Missing`].
    pub fn from_text(text: Option<String>) -> Self {
        match text {
            Some(s) if !s.trim().is_empty() => RawCell::Text(s),
            _ => RawCell::Missing,
        }
    }

    /// Whether this cell carries no data at all.
    pub fn is_missing(&self) -> bool {
        matches!(self, RawCell::Missing)
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        RawCell::from_text(Some(s.to_string()))
    }
}

/// Clean a raw cell into an integer amount.
pub fn clean_cell(cell: &RawCell) -> i64 {
    match cell {
        RawCell::Missing => 0,
        RawCell::Text(text) => clean_text(text),
        RawCell::Integer(n) => *n,
        RawCell::Decimal(f) => truncate_float(*f),
    }
}

/// Clean currency-formatted text into an integer amount.
pub fn clean_text(text: &str) -> i64 {
    let stripped: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect();
    let stripped = stripped.trim();

    if stripped.is_empty() || is_dash_placeholder(stripped) {
        return 0;
    }

    parse_amount(stripped).unwrap_or(0)
}

/// Runs of `-` and the en or em dash characters mean "no data" in the source tables.
fn is_dash_placeholder(s: &str) -> bool {
    s.chars().all(|c| matches!(c, '-' | '\u{2013}' | '\u{2014}'))
}

/// Parse `-?digits(.digits)?`, truncating any fraction.
fn parse_amount(s: &str) -> Option<i64> {
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (unsigned, None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(f) = fraction {
        if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    let magnitude: i64 = whole.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn truncate_float(f: f64) -> i64 {
    if f.is_finite() {
        // `as` saturates at the i64 bounds
        f.trunc() as i64
    } else {
        0
    }
}

#[cfg(test)]
#[path = "cell_test.rs"]
mod tests;
