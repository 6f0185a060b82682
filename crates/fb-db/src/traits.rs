//! Series store trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use fb_core::{AdjustedSeries, Series, SeriesName, WideTable};
use std::path::Path;

/// Rows to persist under a series name.
#[derive(Debug, Clone, Copy)]
pub enum SeriesRows<'a> {
    /// Plain long series: `(entity, year, value)`
    Long(&'a Series),
    /// Adjusted series with provenance columns
    Adjusted(&'a AdjustedSeries),
}

impl SeriesRows<'_> {
    /// Column layout these rows are stored with.
    pub fn layout(&self) -> TableLayout {
        match self {
            SeriesRows::Long(_) => TableLayout::Long,
            SeriesRows::Adjusted(_) => TableLayout::Adjusted,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            SeriesRows::Long(s) => s.len(),
            SeriesRows::Adjusted(s) => s.len(),
        }
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Physical column layout of a series table.
///
/// Both layouts start with `(entity, year, value)`, so any series table can
/// be read back with [`SeriesStore::read_series`]. For adjusted tables
/// `value` holds the adjusted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    Long,
    Adjusted,
}

impl TableLayout {
    /// `(column, type)` pairs in table order.
    pub fn columns(&self) -> &'static [(&'static str, &'static str)] {
        const LONG: &[(&str, &str)] = &[
            ("entity", "VARCHAR"),
            ("year", "INTEGER"),
            ("value", "DOUBLE"),
        ];
        const ADJUSTED: &[(&str, &str)] = &[
            ("entity", "VARCHAR"),
            ("year", "INTEGER"),
            ("value", "DOUBLE"),
            ("original_value", "DOUBLE"),
            ("index_factor", "DOUBLE"),
        ];
        match self {
            TableLayout::Long => LONG,
            TableLayout::Adjusted => ADJUSTED,
        }
    }

    /// Column definitions for `CREATE TABLE`.
    pub fn ddl(&self) -> String {
        self.columns()
            .iter()
            .map(|(name, ty)| format!("{name} {ty}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Keyed table read/write service for series
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait SeriesStore: Send + Sync {
    /// Load a wide CSV file with every cell read as text
    async fn load_wide_csv(&self, path: &Path) -> DbResult<WideTable>;

    /// Read a stored series ordered by `(entity, year)`
    async fn read_series(&self, name: &SeriesName) -> DbResult<Series>;

    /// Replace the full contents of a series table, all or nothing.
    /// Returns the number of rows written.
    async fn replace_series(&self, name: &SeriesName, rows: SeriesRows<'_>) -> DbResult<usize>;

    /// Check if a series table exists
    async fn series_exists(&self, name: &SeriesName) -> DbResult<bool>;

    /// Names of all stored tables, sorted
    async fn list_series(&self) -> DbResult<Vec<String>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
