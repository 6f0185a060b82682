//! Wide-to-long reshaping of per-year source tables.
//!
//! A source table has one row per entity and one column per year:
//!
//! ```text
//! Department,2006,2007,...
//! Allegheny,"$1,234",-,...
//! ```
//!
//! The first column is the entity no matter what its header says. Only
//! columns whose header is a four-digit year inside the configured range are
//! read; years of the range with no column simply produce no records.

use crate::cell::{clean_cell, RawCell};
use crate::error::{CoreError, CoreResult};
use crate::series::{LongRecord, Series, ValueType, YearRange};
use crate::series_name::SeriesName;
use log::debug;
use serde::Serialize;

/// Header of the entity column written by [`pivot_wide`].
pub const ENTITY_HEADER: &str = "entity";

/// A rectangular table as read from a source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WideTable {
    /// Where the table came from (file path), for error messages
    pub source: String,
    /// Column headers
    pub headers: Vec<String>,
    /// Data rows; each row has one cell per header
    pub rows: Vec<Vec<RawCell>>,
}

impl WideTable {
    /// Year columns of this table that fall inside `years`, as
    /// `(column index, year)` pairs in column order.
    pub fn year_columns(&self, years: YearRange) -> Vec<(usize, i32)> {
        self.headers
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(idx, header)| parse_year_header(header).map(|year| (idx, year)))
            .filter(|(_, year)| years.contains(*year))
            .collect()
    }
}

/// Parse a header that is exactly four ASCII digits.
fn parse_year_header(header: &str) -> Option<i32> {
    let h = header.trim();
    if h.len() == 4 && h.bytes().all(|b| b.is_ascii_digit()) {
        h.parse().ok()
    } else {
        None
    }
}

/// Reshape a wide table into a long series.
///
/// Cells are cleaned with [`clean_cell`], so every emitted record has a
/// value. Fails without producing anything when the table has no entity
/// column, no year columns inside `years`, a data row without an entity, or
/// the same entity twice.
pub fn reshape(table: &WideTable, name: SeriesName, years: YearRange) -> CoreResult<Series> {
    if table.headers.is_empty() {
        return Err(CoreError::SchemaMismatch {
            source_name: table.source.clone(),
            reason: "table has no entity column".to_string(),
        });
    }

    let year_columns = table.year_columns(years);
    if year_columns.is_empty() {
        return Err(CoreError::SchemaMismatch {
            source_name: table.source.clone(),
            reason: format!("no year columns in range {years}"),
        });
    }

    let mut records = Vec::with_capacity(table.rows.len() * year_columns.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        if row.iter().all(RawCell::is_missing) {
            continue;
        }

        let entity = match row.first() {
            Some(RawCell::Text(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Some(RawCell::Integer(n)) => n.to_string(),
            _ => {
                return Err(CoreError::SchemaMismatch {
                    source_name: table.source.clone(),
                    // +2: one for the header line, one for 1-based numbering
                    reason: format!("row {} has data but no entity", row_idx + 2),
                })
            }
        };

        for &(col, year) in &year_columns {
            let cell = row.get(col).unwrap_or(&RawCell::Missing);
            records.push(LongRecord {
                entity: entity.clone(),
                year,
                value: Some(clean_cell(cell) as f64),
            });
        }
    }

    debug!(
        "reshaped {} into {} records ({} year columns)",
        table.source,
        records.len(),
        year_columns.len()
    );

    Series::new(name, ValueType::Integer, Some(years), records)
}

/// Pivot a long series back to one row per entity and one column per year.
///
/// Only years inside `years` that have at least one observation become
/// columns. Cells with no record (or a null value) are [`RawCell::Missing`].
pub fn pivot_wide(series: &Series, years: YearRange) -> WideTable {
    let columns: Vec<i32> = series
        .observed_years()
        .into_iter()
        .filter(|y| years.contains(*y))
        .collect();

    let mut headers = Vec::with_capacity(columns.len() + 1);
    headers.push(ENTITY_HEADER.to_string());
    headers.extend(columns.iter().map(|y| y.to_string()));

    let rows = series
        .by_entity()
        .map(|(entity, records)| {
            let mut row = Vec::with_capacity(headers.len());
            row.push(RawCell::Text(entity.to_string()));
            for year in &columns {
                let cell = records
                    .iter()
                    .find(|r| r.year == *year)
                    .and_then(|r| r.value)
                    .map(value_cell)
                    .unwrap_or(RawCell::Missing);
                row.push(cell);
            }
            row
        })
        .collect();

    WideTable {
        source: series.name().to_string(),
        headers,
        rows,
    }
}

fn value_cell(value: f64) -> RawCell {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        RawCell::Integer(value as i64)
    } else {
        RawCell::Decimal(value)
    }
}

#[cfg(test)]
#[path = "reshape_test.rs"]
mod tests;
