//! Domain primitives for planning searches.
//!
//! Filter types and the normalized filter key that partitions the search
//! history. Raw user input never reaches the registry or the store without
//! going through [`FilterType::normalize`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::services::planning_service::SearchError;

/// Which registry field a search filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Postcode,
    LocalAuthority,
}

impl FilterType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postcode => "postcode",
            Self::LocalAuthority => "local_authority",
        }
    }

    /// Normalizes raw user input into the cache partition key.
    ///
    /// Postcodes are lowercased with all whitespace removed, so `"E1 6AN"`
    /// and `"e16an"` share a history. Authority names are lowercased with
    /// whitespace runs collapsed to a single space.
    pub fn normalize(&self, raw: &str) -> Result<FilterKey, SearchError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SearchError::InvalidFilter(format!(
                "{} cannot be empty",
                self.label()
            )));
        }

        let key = match self {
            Self::Postcode => {
                if !trimmed
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
                {
                    return Err(SearchError::InvalidFilter(format!(
                        "Invalid postcode: '{trimmed}'"
                    )));
                }
                trimmed
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_lowercase()
            }
            Self::LocalAuthority => trimmed
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
        };

        Ok(FilterKey(key))
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Postcode => "Postcode",
            Self::LocalAuthority => "Local authority",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postcode" => Ok(Self::Postcode),
            "local_authority" | "authority" => Ok(Self::LocalAuthority),
            other => Err(SearchError::InvalidFilter(format!(
                "Unknown filter type: '{other}'"
            ))),
        }
    }
}

/// Normalized filter value used as the search-history partition key.
///
/// Only [`FilterType::normalize`] constructs one from user input, so every
/// key in the store has been through the same normalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterKey(String);

impl FilterKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps a key that is already normalized, e.g. one read back from storage.
    #[must_use]
    pub const fn from_normalized(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FilterKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
