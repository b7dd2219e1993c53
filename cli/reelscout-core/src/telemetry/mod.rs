//! Popularity telemetry for search terms.
//!
//! A successful, non-empty search is recorded against its normalized search
//! term together with the top result. Recording is best effort; callers log
//! and drop failures.

use chrono::{DateTime, Utc};
use enum_dispatch::enum_dispatch;
use reelscout_catalog::MovieSummary;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod document_store;
mod memory;

pub use document_store::{DocumentStore, DocumentStoreConfig};
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("telemetry store is unavailable")]
    Unavailable(#[source] Option<reqwest::Error>),
    #[error("telemetry store rejected the request with status {0}")]
    Rejected(StatusCode),
    #[error("could not decode telemetry store response")]
    InvalidResponse(#[source] serde_json::Error),
}

/// Popularity counter for one search term, as stored in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Store assigned document id.
    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    pub count: u64,
    pub movie_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl TelemetryRecord {
    /// A first sighting of `search_term`, attributed to `top_result`.
    pub fn first(search_term: String, top_result: &MovieSummary) -> Self {
        Self {
            id: None,
            search_term,
            count: 1,
            movie_id: top_result.id,
            title: top_result.title.clone(),
            poster_url: top_result.poster_url(),
            created_at: Utc::now(),
        }
    }
}

/// Either a hosted document store, or an in-process store.
#[derive(Debug)]
#[enum_dispatch(TelemetrySink)]
pub enum Sink {
    Document(DocumentStore),
    Memory(MemoryStore),
}

#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait TelemetrySink {
    /// Count one more search for `query`, attributing it to `top_result`
    /// if the term is new.
    async fn record(&self, query: &str, top_result: &MovieSummary) -> Result<(), SinkError>;

    /// The `limit` most searched terms, most popular first.
    async fn trending(&self, limit: usize) -> Result<Vec<TelemetryRecord>, SinkError>;
}

/// Key a search term is counted under.
pub fn normalize_term(query: &str) -> String {
    query.trim().to_lowercase()
}
