//! Configuration types and parsing for farebox.yml
//!
//! Every value that shapes a run (year range, inflation tables and their
//! conventions, lags, thresholds, screening bounds) lives here rather than in
//! code.

use crate::error::{CoreError, CoreResult};
use crate::inflation::{IndexConvention, InflationTable};
use crate::lag::CoveragePolicy;
use crate::screen::ScreenBounds;
use crate::series::YearRange;
use crate::series_name::SeriesName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Environment variable overriding `database.path`.
pub const DB_PATH_ENV: &str = "FAREBOX_DB_PATH";

/// Main project configuration from farebox.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,

    /// Store connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Directories containing wide source CSV files
    #[serde(default = "default_source_paths")]
    pub source_paths: Vec<String>,

    /// Year columns read from source files (inclusive)
    pub years: YearRange,

    /// Named inflation tables
    #[serde(default)]
    pub inflation: BTreeMap<String, InflationConfig>,

    /// Inflation adjustments to run
    #[serde(default)]
    pub adjustments: Vec<AdjustmentConfig>,

    /// Lag analyses to run
    #[serde(default)]
    pub analyses: Vec<AnalysisConfig>,

    /// Outlier screens to run
    #[serde(default)]
    pub screens: Vec<ScreenConfig>,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// DuckDB file path, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// A named inflation table and the convention its values follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InflationConfig {
    /// Where the numbers come from
    #[serde(default)]
    pub description: Option<String>,

    /// `present_ratio` or `{ rebase_to_year: N }`
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub convention: IndexConvention,

    /// Year → index
    pub index: InflationTable,
}

/// Adjust `series` with inflation table `table`, writing `output`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdjustmentConfig {
    pub name: String,
    pub series: SeriesName,
    pub table: String,
    pub output: SeriesName,
}

/// Eligibility rule of a lag analysis, applied at the funding year.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EligibilityConfig {
    pub series: SeriesName,
    /// Minimum value (inclusive)
    pub threshold: f64,
}

/// A funding series compared against one or more response series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub name: String,
    pub funding: SeriesName,
    pub responses: Vec<SeriesName>,
    /// Years between the funding change and the response change
    pub lag: i32,
    pub eligibility: EligibilityConfig,
    #[serde(default)]
    pub coverage: CoveragePolicy,
}

/// Pair two series and drop outlier-scale rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreenConfig {
    pub name: String,
    pub series_a: SeriesName,
    pub series_b: SeriesName,
    #[serde(default)]
    pub max_a: Option<f64>,
    #[serde(default)]
    pub max_b: Option<f64>,
    #[serde(default)]
    pub require_positive: bool,
}

impl ScreenConfig {
    /// Bounds to hand to [`crate::screen::screen`].
    pub fn bounds(&self) -> ScreenBounds {
        ScreenBounds {
            max_a: self.max_a,
            max_b: self.max_b,
            require_positive: self.require_positive,
        }
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_source_paths() -> Vec<String> {
    vec!["data".to_string()]
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for farebox.yml or farebox.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("farebox.yml");
        let yaml_path = dir.join("farebox.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(invalid("Project name cannot be empty"));
        }

        if self.years.start > self.years.end {
            return Err(invalid(format!(
                "years.start ({}) is after years.end ({})",
                self.years.start, self.years.end
            )));
        }

        for adjustment in &self.adjustments {
            if !self.inflation.contains_key(&adjustment.table) {
                return Err(invalid(format!(
                    "Adjustment '{}' references unknown inflation table '{}'. Available tables: {}",
                    adjustment.name,
                    adjustment.table,
                    self.inflation
                        .keys()
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
            if adjustment.series == adjustment.output {
                return Err(invalid(format!(
                    "Adjustment '{}' would overwrite its own input series '{}'",
                    adjustment.name, adjustment.series
                )));
            }
        }

        for analysis in &self.analyses {
            if analysis.responses.is_empty() {
                return Err(invalid(format!(
                    "Analysis '{}' needs at least one response series",
                    analysis.name
                )));
            }
            if let Some(coverage) = analysis.coverage.min_entity_coverage {
                if !(0.0..=1.0).contains(&coverage) {
                    return Err(invalid(format!(
                        "Analysis '{}': min_entity_coverage must be between 0 and 1",
                        analysis.name
                    )));
                }
            }
        }

        unique_names("adjustment", self.adjustments.iter().map(|a| a.name.as_str()))?;
        unique_names("analysis", self.analyses.iter().map(|a| a.name.as_str()))?;
        unique_names("screen", self.screens.iter().map(|s| s.name.as_str()))?;

        Ok(())
    }

    /// Get absolute source paths relative to a project root
    pub fn source_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.source_paths.iter().map(|p| root.join(p)).collect()
    }

    /// Inflation table by name
    pub fn inflation_table(&self, name: &str) -> CoreResult<&InflationConfig> {
        self.inflation.get(name).ok_or_else(|| CoreError::Unknown {
            kind: "inflation table",
            name: name.to_string(),
        })
    }

    /// Resolve the database path: CLI override, then `FAREBOX_DB_PATH`,
    /// then `database.path`.
    pub fn resolve_database_path(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(String::from)
            .or_else(|| std::env::var(DB_PATH_ENV).ok().filter(|p| !p.is_empty()))
            .unwrap_or_else(|| self.database.path.clone())
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.into(),
    }
}

fn unique_names<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(invalid(format!("Duplicate {kind} name '{name}'")));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
