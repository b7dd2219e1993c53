//! Catalog client and the trait it is consumed through.

use std::fmt::Debug;
use std::time::Duration;

use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, instrument, warn};

use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, FetchError};
use crate::mock::MockClient;
use crate::types::{CatalogResponse, LogicalFailure, MovieSummary};

pub const DEFAULT_CATALOG_URL: &str = "https://api.themoviedb.org/3";

const SEARCH_PATH: &str = "/search/movie";
const DISCOVER_PATH: &str = "/discover/movie";
const DISCOVER_SORT: &str = "popularity.desc";

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

/// The catalog API interface.
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// Search the catalog for movies matching `query`.
    ///
    /// A blank query lists popular movies instead.
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, FetchError>;
}

/// A client for the catalog service.
///
/// Handles:
/// - HTTP client configuration with timeouts
/// - Bearer token authentication
/// - Endpoint selection and response decoding
pub struct CatalogClient {
    client: reqwest::Client,
    config: CatalogClientConfig,
    base_url: String,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        reqwest::Url::parse(&config.catalog_url)
            .map_err(|_| CatalogClientError::InvalidUrl(config.catalog_url.clone()))?;

        let client = build_http_client(&config)?;
        // Using a URL here adds an extra trailing slash,
        // so join paths onto a plain string.
        let base_url = config.catalog_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn request_for(&self, query: &str) -> reqwest::RequestBuilder {
        let query = query.trim();
        if query.is_empty() {
            self.client
                .get(format!("{}{DISCOVER_PATH}", self.base_url))
                .query(&[("sort_by", DISCOVER_SORT)])
        } else {
            self.client
                .get(format!("{}{SEARCH_PATH}", self.base_url))
                .query(&[("query", query)])
        }
    }
}

impl ClientTrait for CatalogClient {
    #[instrument(skip(self), fields(catalog_url = %self.config.catalog_url))]
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, FetchError> {
        debug!("sending search request");

        let response = self
            .request_for(query)
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "catalog rejected request");
            return Err(FetchError::HttpStatus(status));
        }

        let body = response.bytes().await.map_err(FetchError::Network)?;
        let decoded: CatalogResponse = serde_json::from_slice(&body).map_err(FetchError::Decode)?;

        match decoded.logical_failure() {
            Some(LogicalFailure::Catalog(message)) => return Err(FetchError::ApiError(message)),
            Some(LogicalFailure::Legacy(message)) => {
                warn!(
                    "catalog response used the 'Response'/'Error' failure convention \
                     of a different provider"
                );
                return Err(FetchError::ApiError(message));
            },
            None => {},
        }

        let results = decoded.results.unwrap_or_default();
        debug!(n_results = results.len(), "received search results");
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build HTTP client with bearer token auth for the catalog API.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json"),
    );

    match config.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(header::AUTHORIZATION, value);
                },
                Err(_) => {
                    warn!("catalog token contains invalid characters, sending requests without it")
                },
            }
        },
        _ => debug!("no catalog token configured, sending requests without it"),
    }

    debug!(
        catalog_url = %config.catalog_url,
        has_token = headers.contains_key(header::AUTHORIZATION),
        "building catalog HTTP client"
    );

    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| format!("reelscout/{}", env!("CARGO_PKG_VERSION")));

    reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(CatalogClientError::BuildClient)
}
