use anyhow::{Context, Result};
use reelscout_catalog::{CatalogClient, CatalogClientConfig, Client};
use tracing::debug;

use crate::config::Config;

/// Initialize the catalog API client
///
/// A missing token is not an error, requests are sent without authorization.
pub fn init_catalog_client(config: &Config) -> Result<Client> {
    let client = CatalogClient::new(CatalogClientConfig {
        catalog_url: config.catalog_url.clone(),
        token: config.catalog_token.clone(),
        user_agent: None,
    })
    .context("Could not create catalog client")?;

    debug!(
        catalog_url = %config.catalog_url,
        authorized = config.has_catalog_token(),
        "using catalog client"
    );
    Ok(client.into())
}
