//! Error handling for catalog API operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single catalog request.
///
/// Every variant is recoverable: callers are expected to report a generic
/// message and let the user issue another query.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The catalog answered with a non-success status.
    /// The body is not inspected in this case.
    #[error("catalog responded with status {0}")]
    HttpStatus(StatusCode),
    /// The body decoded but flagged a logical failure.
    #[error("catalog reported an error: {0}")]
    ApiError(String),
    /// The request never produced a response, e.g. the host is offline.
    #[error("could not reach the catalog")]
    Network(#[source] reqwest::Error),
    #[error("could not decode catalog response")]
    Decode(#[source] serde_json::Error),
}

impl FetchError {
    /// Short, stable name of the error kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::HttpStatus(_) => "http_status",
            FetchError::ApiError(_) => "api_error",
            FetchError::Network(_) => "network",
            FetchError::Decode(_) => "decode",
        }
    }
}

/// Errors constructing a catalog client.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("failed to build HTTP client")]
    BuildClient(#[source] reqwest::Error),
    #[error("invalid catalog url '{0}'")]
    InvalidUrl(String),
}
