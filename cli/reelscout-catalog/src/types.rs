//! Catalog interaction types.
//!
//! [`MovieSummary`] is the only type that leaves this crate; the response
//! envelope stays private to the client.

use serde::{Deserialize, Serialize};

/// Base URL poster paths are resolved against.
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Read-only projection of a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    /// `YYYY-MM-DD`, empty or absent for unreleased entries.
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
}

impl MovieSummary {
    /// Absolute URL of the poster image, if the entry has one.
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| format!("{POSTER_BASE_URL}{path}"))
    }

    /// Release year, if the release date is known.
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .filter(|year| !year.is_empty())
    }
}

/// Envelope shared by the search and discover endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CatalogResponse {
    #[serde(default)]
    pub results: Option<Vec<MovieSummary>>,

    /// Set to `false` by the catalog on logical failures, e.g. an invalid key.
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub status_message: Option<String>,

    /// `"False"` on failure in the convention of other movie APIs.
    #[serde(default, rename = "Response")]
    pub legacy_response: Option<String>,
    #[serde(default, rename = "Error")]
    pub legacy_error: Option<String>,
}

/// How a decoded body signalled failure.
#[derive(Debug, PartialEq)]
pub(crate) enum LogicalFailure {
    Catalog(String),
    Legacy(String),
}

impl CatalogResponse {
    pub(crate) fn logical_failure(&self) -> Option<LogicalFailure> {
        if self.success == Some(false) {
            let message = self
                .status_message
                .clone()
                .unwrap_or_else(|| "request was not successful".to_string());
            return Some(LogicalFailure::Catalog(message));
        }

        let legacy_failed = self
            .legacy_response
            .as_deref()
            .is_some_and(|flag| flag.eq_ignore_ascii_case("false"));
        if legacy_failed {
            let message = self
                .legacy_error
                .clone()
                .unwrap_or_else(|| "failed to fetch movies".to_string());
            return Some(LogicalFailure::Legacy(message));
        }

        None
    }
}
