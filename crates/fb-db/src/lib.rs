//! fb-db - Series store for Farebox
//!
//! This crate provides the `SeriesStore` trait and its DuckDB
//! implementation: loading wide CSV sources as text, reading long series
//! back, and replacing a series table atomically.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{SeriesRows, SeriesStore, TableLayout};
