use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use reelscout_catalog::DEFAULT_CATALOG_URL;
use reelscout_core::DEFAULT_DEBOUNCE;
use reelscout_core::telemetry::DocumentStoreConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of reelscout managed directories (config, cache)
const REELSCOUT_DIR_NAME: &str = "reelscout";
const REELSCOUT_CONFIG_DIR_VAR: &str = "REELSCOUT_CONFIG_DIR";
const REELSCOUT_ENV_PREFIX: &str = "REELSCOUT";
pub const REELSCOUT_CONFIG_FILE: &str = "reelscout.toml";

/// Describes the configuration of the reelscout CLI
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the movie catalog API
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub catalog_url: String,

    /// Bearer token for the catalog API
    pub catalog_token: Option<String>,

    /// How long the query has to stay unchanged before it is searched for
    pub debounce_ms: u64,

    /// Directory where reelscout stores its log file (default:
    /// `$XDG_CACHE_HOME/reelscout`)
    pub cache_dir: PathBuf,

    /// Directory where reelscout loads its configuration file from (default:
    /// `$XDG_CONFIG_HOME/reelscout`)
    pub config_dir: PathBuf,

    /// Document store that counts popular searches.
    /// Searches are only counted in memory if this is not set.
    #[serde(default)]
    pub telemetry: Option<DocumentStoreConfig>,
}

impl Config {
    /// Creates a [Config] from defaults, the config file and the environment
    pub fn parse() -> Result<Config> {
        let config_dir = match env::var(REELSCOUT_CONFIG_DIR_VAR) {
            Ok(v) => {
                debug!("`${REELSCOUT_CONFIG_DIR_VAR}` set: {v}");
                PathBuf::from(v)
            },
            Err(_) => {
                let config_dir = dirs::config_dir()
                    .context("Could not determine the user config directory")?
                    .join(REELSCOUT_DIR_NAME);
                debug!("`${REELSCOUT_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
                config_dir
            },
        };
        let cache_dir = dirs::cache_dir()
            .context("Could not determine the user cache directory")?
            .join(REELSCOUT_DIR_NAME);

        let final_config = HierarchicalConfig::builder()
            .set_default("catalog_url", DEFAULT_CATALOG_URL)?
            .set_default("debounce_ms", DEFAULT_DEBOUNCE.as_millis() as u64)?
            .set_default("cache_dir", cache_dir.to_string_lossy().into_owned())?
            // Config dir is added to the config for completeness;
            // the config file cannot change the config dir.
            .set_override("config_dir", config_dir.to_string_lossy().into_owned())?
            .add_source(
                config::File::from(config_dir.join(REELSCOUT_CONFIG_FILE))
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            // override via env variables, `__` separates nested keys
            .add_source(
                Environment::with_prefix(REELSCOUT_ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Could not read config")?;

        let cli_config: Config = final_config
            .try_deserialize()
            .context("Could not parse config")?;
        Ok(cli_config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Whether a token will be sent to the catalog.
    /// A blank token is treated like a missing one.
    pub fn has_catalog_token(&self) -> bool {
        self.catalog_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }
}
