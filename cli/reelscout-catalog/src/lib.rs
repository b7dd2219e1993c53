//! HTTP client for the movie catalog API.
//!
//! This crate provides:
//! - HTTP client construction with bearer token authentication
//! - Decoding of catalog responses into [`MovieSummary`] lists
//! - The error taxonomy for catalog requests
//! - A [`MockClient`] with queued responses for controller tests
//!
//! ## Usage
//!
//! ```ignore
//! use reelscout_catalog::{CatalogClient, CatalogClientConfig, ClientTrait};
//!
//! let config = CatalogClientConfig {
//!     catalog_url: "https://api.themoviedb.org/3".to_string(),
//!     token: Some(token),
//!     user_agent: None,
//! };
//!
//! let client = CatalogClient::new(config)?;
//! let movies = client.search("batman").await?;
//! ```

mod client;
mod config;
mod error;
mod mock;
mod types;

pub use client::{CatalogClient, Client, ClientTrait, DEFAULT_CATALOG_URL};
pub use config::CatalogClientConfig;
pub use error::{CatalogClientError, FetchError};
pub use mock::{MockClient, MockResponse};
pub use types::{MovieSummary, POSTER_BASE_URL};
