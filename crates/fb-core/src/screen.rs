//! Outlier screening of paired observations.
//!
//! Two series are paired on `(entity, year)` and rows whose magnitude is
//! out of scale for the rest of the dataset (large aggregator agencies, for
//! instance) are removed. Bounds are configuration, and every removed row is
//! reported together with the reason, so the exclusion is visible in the
//! output instead of being silent data loss.

use crate::series::Series;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Values of two series at the same `(entity, year)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedObservation {
    pub entity: String,
    pub year: i32,
    pub value_a: f64,
    pub value_b: f64,
}

/// Inner join of two series on `(entity, year)`; rows where either value is
/// null are dropped.
pub fn pair_observations(a: &Series, b: &Series) -> Vec<PairedObservation> {
    a.records()
        .iter()
        .filter_map(|ra| {
            let value_a = ra.value?;
            let value_b = b.get(&ra.entity, ra.year)?.value?;
            Some(PairedObservation {
                entity: ra.entity.clone(),
                year: ra.year,
                value_a,
                value_b,
            })
        })
        .collect()
}

/// Screening bounds. A row is kept only when its value is strictly below
/// the corresponding bound.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreenBounds {
    /// Exclusive upper bound on series A
    #[serde(default)]
    pub max_a: Option<f64>,

    /// Exclusive upper bound on series B
    #[serde(default)]
    pub max_b: Option<f64>,

    /// Drop rows where either value is zero or negative
    #[serde(default)]
    pub require_positive: bool,
}

/// Why a row was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    NonPositive,
    AboveBoundA,
    AboveBoundB,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::NonPositive => write!(f, "non-positive value"),
            ExclusionReason::AboveBoundA => write!(f, "series A at or above bound"),
            ExclusionReason::AboveBoundB => write!(f, "series B at or above bound"),
        }
    }
}

/// A removed row and the first rule it failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exclusion {
    pub observation: PairedObservation,
    pub reason: ExclusionReason,
}

/// Kept and excluded rows of a screening pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScreenOutcome {
    pub kept: Vec<PairedObservation>,
    pub excluded: Vec<Exclusion>,
}

impl ScreenOutcome {
    /// Distinct entities with at least one excluded row.
    pub fn excluded_entities(&self) -> BTreeSet<&str> {
        self.excluded
            .iter()
            .map(|e| e.observation.entity.as_str())
            .collect()
    }

    /// Excluded entities that lost every row.
    pub fn fully_excluded_entities(&self) -> BTreeSet<&str> {
        let kept: BTreeSet<&str> = self.kept.iter().map(|o| o.entity.as_str()).collect();
        self.excluded_entities()
            .into_iter()
            .filter(|e| !kept.contains(e))
            .collect()
    }
}

/// Apply `bounds` to `observations`.
pub fn screen(observations: Vec<PairedObservation>, bounds: &ScreenBounds) -> ScreenOutcome {
    let mut outcome = ScreenOutcome::default();
    for observation in observations {
        match exclusion_reason(&observation, bounds) {
            Some(reason) => outcome.excluded.push(Exclusion {
                observation,
                reason,
            }),
            None => outcome.kept.push(observation),
        }
    }
    outcome
}

fn exclusion_reason(obs: &PairedObservation, bounds: &ScreenBounds) -> Option<ExclusionReason> {
    if bounds.require_positive && (obs.value_a <= 0.0 || obs.value_b <= 0.0) {
        return Some(ExclusionReason::NonPositive);
    }
    if bounds.max_a.is_some_and(|max| obs.value_a >= max) {
        return Some(ExclusionReason::AboveBoundA);
    }
    if bounds.max_b.is_some_and(|max| obs.value_b >= max) {
        return Some(ExclusionReason::AboveBoundB);
    }
    None
}

#[cfg(test)]
#[path = "screen_test.rs"]
mod tests;
