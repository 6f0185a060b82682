//! Shared utilities for CLI commands

use anyhow::Result;
use fb_core::{CoreError, RawCell};
use fb_db::DbError;
use std::collections::HashSet;
use std::fmt;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; never shown to the user.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// General failure.
pub(crate) const EXIT_GENERAL: i32 = 1;
/// Source data or adjustment failure.
pub(crate) const EXIT_DATA: i32 = 2;
/// Store failure.
pub(crate) const EXIT_STORE: i32 = 4;

/// Exit code for a failed pipeline step: store errors are 4, everything
/// else that came out of the domain layer is 2.
pub(crate) fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(db_err) = cause.downcast_ref::<DbError>() {
            return match db_err {
                DbError::Core(_) => EXIT_DATA,
                _ => EXIT_STORE,
            };
        }
        if cause.downcast_ref::<CoreError>().is_some() {
            return EXIT_DATA;
        }
    }
    EXIT_GENERAL
}

/// Select items by a comma-separated name filter.
///
/// With no filter every item is selected. Naming an item that does not
/// exist is an error rather than an empty selection.
pub(crate) fn select_by_name<'a, T>(
    items: &'a [T],
    filter: Option<&str>,
    kind: &'static str,
    name_of: impl Fn(&T) -> &str,
) -> Result<Vec<&'a T>> {
    let Some(filter) = filter else {
        return Ok(items.iter().collect());
    };

    let wanted: HashSet<&str> = filter
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let known: HashSet<&str> = items.iter().map(&name_of).collect();
    let mut missing: Vec<&str> = wanted.difference(&known).copied().collect();
    missing.sort_unstable();
    if let Some(name) = missing.first() {
        return Err(CoreError::Unknown {
            kind,
            name: name.to_string(),
        }
        .into());
    }

    Ok(items
        .iter()
        .filter(|item| wanted.contains(name_of(*item)))
        .collect())
}

/// Calculate column widths for table output.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

/// Print a formatted table to stdout.
///
/// Columns are left-aligned and separated by two spaces, with a dashed
/// line under the header.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    let header_parts: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  ").trim_end());

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));

    for row in rows {
        let row_parts: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", row_parts.join("  ").trim_end());
    }
}

/// Format a number for table output: whole numbers without decimals,
/// everything else with two.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Render a cell for table output.
pub(crate) fn format_cell(cell: &RawCell) -> String {
    match cell {
        RawCell::Missing => String::new(),
        RawCell::Text(s) => s.clone(),
        RawCell::Integer(i) => i.to_string(),
        RawCell::Decimal(f) => format_number(*f),
    }
}

/// Render a cell as a JSON value.
pub(crate) fn cell_to_json(cell: &RawCell) -> serde_json::Value {
    match cell {
        RawCell::Missing => serde_json::Value::Null,
        RawCell::Text(s) => serde_json::Value::String(s.clone()),
        RawCell::Integer(i) => serde_json::Value::from(*i),
        RawCell::Decimal(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
    }
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
