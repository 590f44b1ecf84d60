//! Domain service for planning-application searches.
//!
//! A search fetches the current registry results for a filter, compares them
//! with the previous snapshot stored for the same filter key and reports the
//! applications that were not there last time.

use crate::domain::{FilterKey, FilterType};
use crate::models::DeltaResult;
use thiserror::Error;
use url::Url;

/// Errors specific to planning searches.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Bad caller input. Raised before any I/O happens.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Planning registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("Search cache unavailable: {0}")]
    CacheUnavailable(String),
}

impl From<sea_orm::DbErr> for SearchError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::CacheUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        Self::CacheUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        Self::RegistryUnavailable(err.to_string())
    }
}

/// Raw search input as it arrives from a form or the CLI.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub filter_type: FilterType,
    pub filter_value: String,
    pub limit: u32,
    pub webhook_url: Option<String>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(filter_type: FilterType, filter_value: impl Into<String>, limit: u32) -> Self {
        Self {
            filter_type,
            filter_value: filter_value.into(),
            limit,
            webhook_url: None,
        }
    }

    #[must_use]
    pub fn with_webhook(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }
}

/// A validated, normalized filter. The registry client only accepts these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub filter_type: FilterType,
    pub key: FilterKey,
    pub limit: u32,
}

impl SearchFilter {
    pub fn new(
        filter_type: FilterType,
        raw_value: &str,
        limit: u32,
        max_limit: u32,
    ) -> Result<Self, SearchError> {
        if !(1..=max_limit).contains(&limit) {
            return Err(SearchError::InvalidFilter(format!(
                "Invalid limit: {limit}. Limit must be between 1 and {max_limit}"
            )));
        }

        let key = filter_type.normalize(raw_value)?;

        Ok(Self {
            filter_type,
            key,
            limit,
        })
    }
}

/// Parses an optional caller-supplied webhook URL. Only http(s) is accepted.
pub fn parse_webhook_url(raw: Option<&str>) -> Result<Option<Url>, SearchError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let url = Url::parse(raw)
        .map_err(|e| SearchError::InvalidFilter(format!("Invalid webhook URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(Some(url)),
        scheme => Err(SearchError::InvalidFilter(format!(
            "Webhook URL must use http or https, got '{scheme}'"
        ))),
    }
}

/// Domain service trait for planning searches.
#[async_trait::async_trait]
pub trait PlanningService: Send + Sync {
    /// Runs one search and reports what is new since the previous snapshot.
    async fn search(&self, request: SearchRequest) -> Result<DeltaResult, SearchError>;

    /// Waits for webhook deliveries started by earlier searches.
    ///
    /// Callers that are about to shut the runtime down must await this first.
    async fn flush(&self) {}
}
