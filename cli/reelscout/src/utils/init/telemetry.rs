use anyhow::{Context, Result};
use reelscout_core::telemetry::{DocumentStore, MemoryStore, Sink};
use tracing::debug;

use crate::config::Config;

/// Initialize the sink that counts popular searches
///
/// - Use the document store if one is configured
/// - Count in memory for the lifetime of the session otherwise
pub fn init_telemetry_sink(config: &Config) -> Result<Sink> {
    match &config.telemetry {
        Some(store_config) => {
            debug!(endpoint = %store_config.endpoint, "using document store for telemetry");
            let store = DocumentStore::new(store_config.clone())
                .context("Could not create telemetry store client")?;
            Ok(store.into())
        },
        None => {
            debug!("no telemetry store configured, counting searches in memory");
            Ok(MemoryStore::new().into())
        },
    }
}
