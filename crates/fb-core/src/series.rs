//! Long-format series: one `(entity, year, value)` record per observation.

use crate::error::{CoreError, CoreResult};
use crate::series_name::SeriesName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    /// First year (inclusive)
    pub start: i32,
    /// Last year (inclusive)
    pub end: i32,
}

impl YearRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: i32, end: i32) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::ConfigInvalid {
                message: format!("year range start {start} is after end {end}"),
            });
        }
        Ok(Self { start, end })
    }

    /// Whether `year` falls inside the range.
    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// Iterate the years of the range in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    /// Number of years in the range.
    pub fn len(&self) -> usize {
        (self.end - self.start + 1).max(0) as usize
    }

    /// Always false for a validated range.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Declared type of a series' values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Whole amounts (cleaned source cells)
    #[default]
    Integer,
    /// Fractional amounts (derived, e.g. inflation-adjusted)
    Decimal,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Integer => write!(f, "integer"),
            ValueType::Decimal => write!(f, "decimal"),
        }
    }
}

/// One observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    /// Funded/observed unit, e.g. a transit agency
    pub entity: String,
    /// Observation year
    pub year: i32,
    /// Observed value; `None` when the store holds a null
    pub value: Option<f64>,
}

impl LongRecord {
    /// Convenience constructor for a non-null observation.
    pub fn new(entity: impl Into<String>, year: i32, value: f64) -> Self {
        Self {
            entity: entity.into(),
            year,
            value: Some(value),
        }
    }
}

/// A named long-format table whose `(entity, year)` keys are unique.
///
/// Records are always held sorted by `(entity, year)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    name: SeriesName,
    value_type: ValueType,
    years: Option<YearRange>,
    records: Vec<LongRecord>,
}

impl Series {
    /// Build a series, sorting the records and rejecting duplicate keys.
    pub fn new(
        name: SeriesName,
        value_type: ValueType,
        years: Option<YearRange>,
        mut records: Vec<LongRecord>,
    ) -> CoreResult<Self> {
        records.sort_by(|a, b| a.entity.cmp(&b.entity).then(a.year.cmp(&b.year)));

        if let Some(dup) = records
            .windows(2)
            .find(|w| w[0].entity == w[1].entity && w[0].year == w[1].year)
        {
            return Err(CoreError::DuplicateObservation {
                series: name.to_string(),
                entity: dup[0].entity.clone(),
                year: dup[0].year,
            });
        }

        Ok(Self {
            name,
            value_type,
            years,
            records,
        })
    }

    /// Series name (also the store table name).
    pub fn name(&self) -> &SeriesName {
        &self.name
    }

    /// Declared value type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Declared year domain, if the series was reshaped from a source table.
    pub fn years(&self) -> Option<YearRange> {
        self.years
    }

    /// Records in `(entity, year)` order.
    pub fn records(&self) -> &[LongRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the series has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct entities in sorted order.
    pub fn entities(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.entity.as_str()).collect()
    }

    /// Distinct observed years in ascending order.
    pub fn observed_years(&self) -> BTreeSet<i32> {
        self.records.iter().map(|r| r.year).collect()
    }

    /// Look up the record for `(entity, year)`.
    pub fn get(&self, entity: &str, year: i32) -> Option<&LongRecord> {
        self.records
            .binary_search_by(|r| r.entity.as_str().cmp(entity).then(r.year.cmp(&year)))
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Records grouped by entity, each group in ascending year order.
    pub fn by_entity(&self) -> impl Iterator<Item = (&str, &[LongRecord])> {
        self.records
            .chunk_by(|a, b| a.entity == b.entity)
            .map(|group| (group[0].entity.as_str(), group))
    }
}

#[cfg(test)]
#[path = "series_test.rs"]
mod tests;
