//! Error types for fb-core

use thiserror::Error;

/// Core error type for Farebox
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {0}")]
    ConfigParseError(#[from] serde_yaml::Error),

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Project directory not found
    #[error("[E004] Project directory not found: {path}")]
    ProjectNotFound { path: String },

    /// E005: IO error
    #[error("[E005] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E006: IO error with file path context
    #[error("[E006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// S001: Source table cannot be reshaped (no entity column, no year columns, ...)
    #[error("[S001] Schema mismatch in '{source_name}': {reason}")]
    SchemaMismatch { source_name: String, reason: String },

    /// S002: The same (entity, year) key appears twice in one series
    #[error("[S002] Duplicate observation in series '{series}': entity '{entity}', year {year}")]
    DuplicateObservation {
        series: String,
        entity: String,
        year: i32,
    },

    /// S003: Series name is not a usable table identifier
    #[error("[S003] Invalid series name '{name}': {reason}")]
    InvalidSeriesName { name: String, reason: String },

    /// I001: Inflation table has no index for a year the series needs
    #[error("[I001] Inflation table has no index for year {year} (series '{series}')")]
    MissingIndex { series: String, year: i32 },

    /// I002: Inflation index value is not a positive finite number
    #[error("[I002] Invalid inflation index for year {year}: {value}")]
    InvalidIndex { year: i32, value: f64 },

    /// L001: Configuration references a series or table that does not exist
    #[error("[L001] Unknown {kind} '{name}'")]
    Unknown { kind: &'static str, name: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
