//! Inflation adjustment as a pure value transform.
//!
//! Two conventions exist for price-index tables and they are not
//! interchangeable:
//!
//! - [`IndexConvention::RebaseToYear`]: the table holds raw index levels
//!   (e.g. CPI-U) and every value is scaled by `index[year] / index[base]`.
//! - [`IndexConvention::PresentRatio`]: the table already holds ratios to the
//!   most recent year, so the factor is `index[year]` itself.
//!
//! Every adjusted record keeps its original value and the factor applied.

use crate::error::{CoreError, CoreResult};
use crate::series::{LongRecord, Series, ValueType};
use crate::series_name::SeriesName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Year → price index mapping. All indices are finite and positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InflationTable {
    index: BTreeMap<i32, f64>,
}

impl<'de> Deserialize<'de> for InflationTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let index = BTreeMap::<i32, f64>::deserialize(deserializer)?;
        InflationTable::new(index).map_err(serde::de::Error::custom)
    }
}

impl InflationTable {
    /// Build a table, rejecting non-finite or non-positive indices.
    pub fn new(index: BTreeMap<i32, f64>) -> CoreResult<Self> {
        if let Some((&year, &value)) = index.iter().find(|(_, v)| !(v.is_finite() && **v > 0.0))
        {
            return Err(CoreError::InvalidIndex { year, value });
        }
        Ok(Self { index })
    }

    /// Index for `year`, if the table covers it.
    pub fn get(&self, year: i32) -> Option<f64> {
        self.index.get(&year).copied()
    }

    /// Years covered by the table, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.index.keys().copied()
    }
}

/// How index values turn into scale factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexConvention {
    /// factor = index[year] / index[base_year]
    RebaseToYear(i32),
    /// factor = index[year]; the table is pre-normalized to the present
    PresentRatio,
}

impl std::fmt::Display for IndexConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexConvention::RebaseToYear(base) => write!(f, "rebase to {base}"),
            IndexConvention::PresentRatio => write!(f, "present ratio"),
        }
    }
}

/// One adjusted observation with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustedRecord {
    pub entity: String,
    pub year: i32,
    pub original_value: Option<f64>,
    pub index_factor: f64,
    pub adjusted_value: Option<f64>,
}

/// Result of adjusting a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustedSeries {
    /// Output series name
    pub name: SeriesName,
    /// Series the values came from
    pub source: SeriesName,
    /// Convention the factors were computed with
    pub convention: IndexConvention,
    /// Records in `(entity, year)` order
    pub records: Vec<AdjustedRecord>,
}

impl AdjustedSeries {
    /// Adjusted values as a plain series.
    pub fn to_series(&self) -> CoreResult<Series> {
        Series::new(
            self.name.clone(),
            ValueType::Decimal,
            None,
            self.records
                .iter()
                .map(|r| LongRecord {
                    entity: r.entity.clone(),
                    year: r.year,
                    value: r.adjusted_value,
                })
                .collect(),
        )
    }

    /// Rebuild the unadjusted input series from the retained originals.
    pub fn originals(&self) -> CoreResult<Series> {
        Series::new(
            self.source.clone(),
            ValueType::Decimal,
            None,
            self.records
                .iter()
                .map(|r| LongRecord {
                    entity: r.entity.clone(),
                    year: r.year,
                    value: r.original_value,
                })
                .collect(),
        )
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Adjust every value of `series` with `table` under `convention`.
///
/// Fails with [`CoreError::MissingIndex`] when the base year or any record's
/// year is not in the table; nothing is returned in that case.
pub fn adjust(
    series: &Series,
    table: &InflationTable,
    convention: IndexConvention,
    output: SeriesName,
) -> CoreResult<AdjustedSeries> {
    let missing = |year: i32| CoreError::MissingIndex {
        series: series.name().to_string(),
        year,
    };

    let divisor = match convention {
        IndexConvention::RebaseToYear(base) => table.get(base).ok_or_else(|| missing(base))?,
        IndexConvention::PresentRatio => 1.0,
    };

    let records = series
        .records()
        .iter()
        .map(|record| {
            let index = table.get(record.year).ok_or_else(|| missing(record.year))?;
            let factor = index / divisor;
            Ok(AdjustedRecord {
                entity: record.entity.clone(),
                year: record.year,
                original_value: record.value,
                index_factor: factor,
                adjusted_value: record.value.map(|v| v * factor),
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    log::debug!(
        "adjusted {} records of {} ({convention})",
        records.len(),
        series.name()
    );

    Ok(AdjustedSeries {
        name: output,
        source: series.name().clone(),
        convention,
        records,
    })
}

#[cfg(test)]
#[path = "inflation_test.rs"]
mod tests;
