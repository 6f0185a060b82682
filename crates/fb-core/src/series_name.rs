//! Strongly-typed series name.
//!
//! A series name doubles as the store table identifier, so it is restricted
//! to lower-case ASCII identifiers (`[a-z_][a-z0-9_]*`). Every table name that
//! reaches SQL goes through this type.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// A validated, non-empty series (table) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SeriesName(String);

impl<'de> Deserialize<'de> for SeriesName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SeriesName::parse(s).map_err(serde::de::Error::custom)
    }
}

impl SeriesName {
    /// Validate `name` as a series identifier.
    pub fn parse(name: impl Into<String>) -> CoreResult<Self> {
        let s = name.into();
        let invalid = |reason: &str| CoreError::InvalidSeriesName {
            name: s.clone(),
            reason: reason.to_string(),
        };

        let mut chars = s.chars();
        match chars.next() {
            None => return Err(invalid("must not be empty")),
            Some(c) if !(c.is_ascii_lowercase() || c == '_') => {
                return Err(invalid("must start with a lower-case letter or '_'"))
            }
            Some(_) => {}
        }
        if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
            return Err(invalid("only a-z, 0-9 and '_' are allowed"));
        }
        Ok(Self(s))
    }

    /// Derive a series name from a source file stem.
    ///
    /// The stem is lower-cased and every character outside `[a-z0-9_]` becomes
    /// `_`; a leading digit gets a `_` prefix. Returns an error only when the
    /// stem is empty.
    pub fn from_file_stem(stem: &str) -> CoreResult<Self> {
        let mut normalized: String = stem
            .trim()
            .chars()
            .map(|c| {
                let c = c.to_ascii_lowercase();
                if c.is_ascii_lowercase() || c.is_ascii_digit() {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if normalized.starts_with(|c: char| c.is_ascii_digit()) {
            normalized.insert(0, '_');
        }
        Self::parse(normalized)
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted SQL identifier for this name.
    ///
    /// The character set is restricted at construction, so no escaping is
    /// needed.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl std::fmt::Display for SeriesName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SeriesName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for SeriesName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for SeriesName {
    type Error = CoreError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl PartialEq<&str> for SeriesName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "series_name_test.rs"]
mod tests;
