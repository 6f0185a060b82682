//! Project discovery and loading

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::series_name::SeriesName;
use std::path::{Path, PathBuf};

/// A wide source CSV file and the series it becomes.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Series name derived from the file stem
    pub name: SeriesName,
    /// Absolute path to the CSV file
    pub path: PathBuf,
}

impl SourceFile {
    /// Build a source file entry from a CSV path.
    pub fn from_path(path: PathBuf) -> CoreResult<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| CoreError::InvalidSeriesName {
                name: path.display().to_string(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;
        let name = SeriesName::from_file_stem(stem)?;
        Ok(Self { name, path })
    }
}

/// Represents a Farebox project
#[derive(Debug)]
pub struct Project {
    /// Project root directory
    pub root: PathBuf,

    /// Project configuration
    pub config: Config,

    /// Source files discovered under `source_paths`, sorted by name
    pub sources: Vec<SourceFile>,
}

impl Project {
    /// Load a project from a directory
    pub fn load(path: &Path) -> CoreResult<Self> {
        let root = Self::absolute_root(path)?;
        let config = Config::load_from_dir(&root)?;
        Self::with_config(root, config)
    }

    /// Load a project from a directory using an explicit config file
    pub fn load_with_config_file(path: &Path, config_path: &Path) -> CoreResult<Self> {
        let root = Self::absolute_root(path)?;
        let config = Config::load(config_path)?;
        Self::with_config(root, config)
    }

    fn absolute_root(path: &Path) -> CoreResult<PathBuf> {
        let root = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        if !root.exists() {
            return Err(CoreError::ProjectNotFound {
                path: root.display().to_string(),
            });
        }
        Ok(root)
    }

    fn with_config(root: PathBuf, config: Config) -> CoreResult<Self> {
        let sources = discover_sources(&config.source_paths_absolute(&root))?;
        log::debug!("discovered {} source files under {}", sources.len(), root.display());
        Ok(Self {
            root,
            config,
            sources,
        })
    }

    /// Look up a discovered source by series name
    pub fn get_source(&self, name: &str) -> Option<&SourceFile> {
        self.sources.iter().find(|s| s.name.as_str() == name)
    }
}

/// Discover all `*.csv` files under `source_paths`, recursively.
///
/// Missing directories are skipped. Two files mapping to the same series
/// name are rejected, since one would silently replace the other in the
/// store.
pub fn discover_sources(source_paths: &[PathBuf]) -> CoreResult<Vec<SourceFile>> {
    let mut sources = Vec::new();

    for source_path in source_paths {
        if !source_path.exists() {
            continue;
        }
        discover_sources_recursive(source_path, &mut sources)?;
    }

    // Sort sources by name for consistent ordering
    sources.sort_by(|a, b| a.name.cmp(&b.name));

    if let Some(pair) = sources.windows(2).find(|w| w[0].name == w[1].name) {
        return Err(CoreError::ConfigInvalid {
            message: format!(
                "Source files {} and {} both map to series '{}'",
                pair[0].path.display(),
                pair[1].path.display(),
                pair[0].name
            ),
        });
    }

    Ok(sources)
}

fn discover_sources_recursive(dir: &Path, sources: &mut Vec<SourceFile>) -> CoreResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            discover_sources_recursive(&path, sources)?;
        } else if path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        {
            sources.push(SourceFile::from_path(path)?);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "project_test.rs"]
mod tests;
