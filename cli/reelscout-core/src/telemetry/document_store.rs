use std::fmt::Debug;
use std::time::Duration;

use reelscout_catalog::MovieSummary;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::{SinkError, TelemetryRecord, TelemetrySink, normalize_term};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";

/// Connection settings for the hosted document database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStoreConfig {
    /// API endpoint, e.g. `https://cloud.appwrite.io/v1`
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    /// Server API key. Without one, the collection has to allow
    /// anonymous reads and writes.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Telemetry sink backed by a collection in a hosted document database.
///
/// Each search term is one document; the document is looked up by its
/// `searchTerm` attribute and then either patched or created.
pub struct DocumentStore {
    client: reqwest::Client,
    config: DocumentStoreConfig,
    documents_url: String,
}

impl Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("documents_url", &self.documents_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<TelemetryRecord>,
}

impl DocumentStore {
    pub fn new(config: DocumentStoreConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SinkError::Unavailable(Some(e)))?;

        let documents_url = format!(
            "{}/databases/{}/collections/{}/documents",
            config.endpoint.trim_end_matches('/'),
            config.database_id,
            config.collection_id,
        );

        Ok(Self {
            client,
            config,
            documents_url,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header(PROJECT_HEADER, &self.config.project_id);
        match &self.config.api_key {
            Some(key) => request.header(KEY_HEADER, key),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SinkError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| SinkError::Unavailable(Some(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected(status));
        }
        Ok(response)
    }

    async fn list(&self, queries: &[serde_json::Value]) -> Result<Vec<TelemetryRecord>, SinkError> {
        let params = queries
            .iter()
            .map(|query| ("queries[]", query.to_string()))
            .collect::<Vec<_>>();

        let response = self
            .send(self.client.get(&self.documents_url).query(&params))
            .await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| SinkError::Unavailable(Some(e)))?;
        let list: DocumentList =
            serde_json::from_slice(&body).map_err(SinkError::InvalidResponse)?;
        Ok(list.documents)
    }

    async fn find(&self, term: &str) -> Result<Option<TelemetryRecord>, SinkError> {
        let documents = self
            .list(&[
                json!({ "method": "equal", "attribute": "searchTerm", "values": [term] }),
                json!({ "method": "limit", "values": [1] }),
            ])
            .await?;
        Ok(documents.into_iter().next())
    }
}

impl TelemetrySink for DocumentStore {
    #[instrument(skip_all, fields(query = %query))]
    async fn record(&self, query: &str, top_result: &MovieSummary) -> Result<(), SinkError> {
        let term = normalize_term(query);

        match self.find(&term).await? {
            Some(TelemetryRecord {
                id: Some(id),
                count,
                ..
            }) => {
                let count = count + 1;
                self.send(
                    self.client
                        .patch(format!("{}/{id}", self.documents_url))
                        .json(&json!({ "data": { "count": count } })),
                )
                .await?;
                debug!(term = %term, count, "incremented search count");
            },
            Some(_) => {
                // Listing always returns `$id`; anything else is not a document.
                return Err(SinkError::InvalidResponse(
                    <serde_json::Error as serde::de::Error>::missing_field("$id"),
                ));
            },
            None => {
                let record = TelemetryRecord::first(term.clone(), top_result);
                let document_id = uuid::Uuid::new_v4().simple().to_string();
                self.send(self.client.post(&self.documents_url).json(&json!({
                    "documentId": document_id,
                    "data": record,
                })))
                .await?;
                debug!(term = %term, movie_id = top_result.id, "created search record");
            },
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn trending(&self, limit: usize) -> Result<Vec<TelemetryRecord>, SinkError> {
        self.list(&[
            json!({ "method": "orderDesc", "attribute": "count" }),
            json!({ "method": "limit", "values": [limit] }),
        ])
        .await
    }
}
