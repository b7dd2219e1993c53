//! Configuration types for catalog client construction.

/// Configuration for catalog client construction.
#[derive(Debug, Clone, Default)]
pub struct CatalogClientConfig {
    /// Base URL for the catalog API, without a trailing path separator.
    pub catalog_url: String,
    /// Bearer token sent with every request.
    ///
    /// A missing token is not an error here; the catalog rejects the request
    /// and the rejection surfaces as a [`crate::FetchError::HttpStatus`].
    pub token: Option<String>,
    /// Override for the `User-Agent` header.
    pub user_agent: Option<String>,
}
