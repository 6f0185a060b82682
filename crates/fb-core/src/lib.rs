//! fb-core - Core library for Farebox
//!
//! This crate provides the long-format series model, configuration parsing,
//! project discovery, and the pure transforms of the pipeline: numeric
//! cleaning, wide-to-long reshaping, inflation adjustment, the temporal-lag
//! join, and outlier screening.

pub mod cell;
pub mod config;
pub mod error;
pub mod inflation;
pub mod lag;
pub mod project;
pub mod reshape;
pub mod screen;
pub mod series;
pub mod series_name;

pub use cell::{clean_cell, clean_text, RawCell};
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use inflation::{adjust, AdjustedRecord, AdjustedSeries, IndexConvention, InflationTable};
pub use lag::{
    lag_join, lag_join_many, percent_changes, CoveragePolicy, CoverageWarning, JoinReport,
    LagJoinInput, LagJoinOutcome, LagJoinResult,
};
pub use project::{Project, SourceFile};
pub use reshape::{pivot_wide, reshape, WideTable};
pub use screen::{pair_observations, screen, PairedObservation, ScreenBounds, ScreenOutcome};
pub use series::{LongRecord, Series, ValueType, YearRange};
pub use series_name::SeriesName;
