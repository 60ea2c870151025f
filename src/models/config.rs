use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Configuration options of the adverts service.
///
/// Loaded from `config/default.yaml`, then `config/{APP_ENV}.yaml` when
/// present, then `APP_*` environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// Path of the SQLite database file.
    pub database_url: String,
    pub bind_address: String,
    pub port: u16,
    /// Lifetime of cached ad listings, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Maximum number of cached listings.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> u64 {
    10_000
}

impl ServerConfig {
    /// Load configuration from the `config` directory of the working
    /// directory.
    pub fn load() -> Result<Self, ConfigError> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        Self::load_from(Path::new("config"), &app_env)
    }

    pub fn load_from(dir: &Path, app_env: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(dir.join("default")))
            .add_source(File::from(dir.join(app_env)).required(false))
            .add_source(Environment::with_prefix("APP").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
