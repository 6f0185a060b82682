//! Temporal-lag join between a funding series and a response series.
//!
//! For each entity, the percent change of the funding series in year `Y` is
//! paired with the percent change of the response series in year `Y + lag`.
//! A pair survives only when
//!
//! 1. the response series has a row at `(entity, Y + lag)` (inner join),
//! 2. the eligibility series has a value at `(entity, Y)` that is at least
//!    the threshold,
//! 3. both percent changes are defined and finite.
//!
//! Output rows are ordered by `(entity, year_a)`.

use crate::series::Series;
use crate::series_name::SeriesName;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Year-over-year percent change of one observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentChange {
    pub entity: String,
    pub year: i32,
    pub value: Option<f64>,
    /// `None` for an entity's first observation or when either value is
    /// null. Division by a zero prior value yields a non-finite number.
    pub pct_change: Option<f64>,
}

/// Percent change of each record relative to the entity's preceding
/// observation, in `(entity, year)` order.
pub fn percent_changes(series: &Series) -> Vec<PercentChange> {
    changes(series)
        .map(|(entity, year, value, pct_change)| PercentChange {
            entity: entity.to_string(),
            year,
            value,
            pct_change,
        })
        .collect()
}

/// Borrowing form of [`percent_changes`]: `(entity, year, value, pct)`.
fn changes(series: &Series) -> impl Iterator<Item = (&str, i32, Option<f64>, Option<f64>)> {
    series.by_entity().flat_map(|(entity, records)| {
        let mut previous: Option<Option<f64>> = None;
        records.iter().map(move |record| {
            let pct = match (previous, record.value) {
                (Some(Some(prior)), Some(current)) => Some((current - prior) / prior * 100.0),
                _ => None,
            };
            previous = Some(record.value);
            (entity, record.year, record.value, pct)
        })
    })
}

/// When a join result is considered suspiciously thin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoveragePolicy {
    /// Warn when fewer rows than this survive
    #[serde(default)]
    pub min_retained_rows: Option<usize>,

    /// Warn when the share of funding entities with at least one output row
    /// falls below this fraction (0.0..=1.0)
    #[serde(default)]
    pub min_entity_coverage: Option<f64>,
}

/// Non-fatal coverage diagnostic.
///
/// Low coverage usually means the lag or the year ranges are misconfigured
/// rather than that the data is genuinely absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoverageWarning {
    TooFewRows { retained: usize, minimum: usize },
    LowEntityCoverage {
        retained: usize,
        total: usize,
        minimum: f64,
    },
}

impl std::fmt::Display for CoverageWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverageWarning::TooFewRows { retained, minimum } => write!(
                f,
                "only {retained} rows retained (minimum {minimum}); check lag and year ranges"
            ),
            CoverageWarning::LowEntityCoverage {
                retained,
                total,
                minimum,
            } => write!(
                f,
                "only {retained} of {total} entities retained (minimum coverage {:.0}%)",
                minimum * 100.0
            ),
        }
    }
}

/// Inputs to one lag join.
#[derive(Debug, Clone, Copy)]
pub struct LagJoinInput<'a> {
    /// Series A, observed at year `Y`
    pub funding: &'a Series,
    /// Series B, observed at year `Y + lag`
    pub response: &'a Series,
    /// Year offset from A to B
    pub lag: i32,
    /// Auxiliary series checked at year `Y`
    pub eligibility: &'a Series,
    /// Minimum eligibility value (inclusive)
    pub threshold: f64,
    pub coverage: CoveragePolicy,
}

/// One aligned pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LagJoinResult {
    pub entity: String,
    pub year_a: i32,
    pub year_b: i32,
    pub pct_change_a: f64,
    pub pct_change_b: f64,
    pub auxiliary_value: f64,
}

/// Row accounting for one lag join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinReport {
    pub funding: SeriesName,
    pub response: SeriesName,
    pub eligibility: SeriesName,
    pub lag: i32,
    pub threshold: f64,
    /// Rows of the funding series considered
    pub candidates: usize,
    /// No response row at `Y + lag`
    pub unmatched: usize,
    /// Eligibility value absent or below the threshold
    pub ineligible: usize,
    /// A percent change was undefined or non-finite
    pub undefined_change: usize,
    pub emitted: usize,
    pub funding_entities: usize,
    pub retained_entities: usize,
    pub warnings: Vec<CoverageWarning>,
}

/// Min/max of one percent-change column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeRange {
    pub min: f64,
    pub max: f64,
}

/// Rows and report of one lag join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LagJoinOutcome {
    pub rows: Vec<LagJoinResult>,
    pub report: JoinReport,
}

impl LagJoinOutcome {
    /// Ranges of `pct_change_a` and `pct_change_b`, or `None` without rows.
    pub fn change_ranges(&self) -> Option<(ChangeRange, ChangeRange)> {
        let first = self.rows.first()?;
        let seed = |v: f64| ChangeRange { min: v, max: v };
        let widen = |r: ChangeRange, v: f64| ChangeRange {
            min: r.min.min(v),
            max: r.max.max(v),
        };
        Some(self.rows.iter().skip(1).fold(
            (seed(first.pct_change_a), seed(first.pct_change_b)),
            |(a, b), row| (widen(a, row.pct_change_a), widen(b, row.pct_change_b)),
        ))
    }
}

/// Align the funding series with the response series at the given lag.
pub fn lag_join(input: &LagJoinInput<'_>) -> LagJoinOutcome {
    let funding_changes = percent_changes(input.funding);
    let response_changes: HashMap<(&str, i32), Option<f64>> = changes(input.response)
        .map(|(entity, year, _, pct)| ((entity, year), pct))
        .collect();

    let mut report = JoinReport {
        funding: input.funding.name().clone(),
        response: input.response.name().clone(),
        eligibility: input.eligibility.name().clone(),
        lag: input.lag,
        threshold: input.threshold,
        candidates: funding_changes.len(),
        unmatched: 0,
        ineligible: 0,
        undefined_change: 0,
        emitted: 0,
        funding_entities: input.funding.entities().len(),
        retained_entities: 0,
        warnings: Vec::new(),
    };

    let mut rows = Vec::new();
    for change in &funding_changes {
        let Some(year_b) = change.year.checked_add(input.lag) else {
            report.unmatched += 1;
            continue;
        };
        let Some(&pct_b) = response_changes.get(&(change.entity.as_str(), year_b)) else {
            report.unmatched += 1;
            continue;
        };

        let auxiliary = input
            .eligibility
            .get(&change.entity, change.year)
            .and_then(|r| r.value)
            .filter(|v| *v >= input.threshold);
        let Some(auxiliary_value) = auxiliary else {
            report.ineligible += 1;
            continue;
        };

        match (finite(change.pct_change), finite(pct_b)) {
            (Some(pct_change_a), Some(pct_change_b)) => rows.push(LagJoinResult {
                entity: change.entity.clone(),
                year_a: change.year,
                year_b,
                pct_change_a,
                pct_change_b,
                auxiliary_value,
            }),
            _ => report.undefined_change += 1,
        }
    }

    report.emitted = rows.len();
    report.retained_entities = rows
        .iter()
        .map(|r| r.entity.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    report.warnings = coverage_warnings(&report, &input.coverage);
    for warning in &report.warnings {
        warn!(
            "lag join {} -> {} (lag {}): {warning}",
            report.funding, report.response, report.lag
        );
    }

    LagJoinOutcome { rows, report }
}

/// Run [`lag_join`] once per response series, sharing funding, lag and
/// eligibility.
pub fn lag_join_many(
    funding: &Series,
    responses: &[&Series],
    lag: i32,
    eligibility: &Series,
    threshold: f64,
    coverage: CoveragePolicy,
) -> Vec<LagJoinOutcome> {
    responses
        .iter()
        .map(|response| {
            lag_join(&LagJoinInput {
                funding,
                response,
                lag,
                eligibility,
                threshold,
                coverage,
            })
        })
        .collect()
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn coverage_warnings(report: &JoinReport, policy: &CoveragePolicy) -> Vec<CoverageWarning> {
    let mut warnings = Vec::new();
    if let Some(minimum) = policy.min_retained_rows {
        if report.emitted < minimum {
            warnings.push(CoverageWarning::TooFewRows {
                retained: report.emitted,
                minimum,
            });
        }
    }
    if let Some(minimum) = policy.min_entity_coverage {
        if report.funding_entities > 0 {
            let share = report.retained_entities as f64 / report.funding_entities as f64;
            if share < minimum {
                warnings.push(CoverageWarning::LowEntityCoverage {
                    retained: report.retained_entities,
                    total: report.funding_entities,
                    minimum,
                });
            }
        }
    }
    warnings
}

#[cfg(test)]
#[path = "lag_test.rs"]
mod tests;
