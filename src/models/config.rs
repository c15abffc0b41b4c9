//! Configuration model loaded from external sources.

use std::env;

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::db::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_MAX_CONNECTIONS, PoolSettings};

fn default_rate_limit_requests() -> u32 {
    60
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_jobs_interval_secs() -> u64 {
    60
}

fn default_db_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_db_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

#[derive(Clone, Debug, Deserialize)]
/// Settings shared by the HTTP server and the background job runner.
pub struct ServerConfig {
    pub domain: String,
    pub address: String,
    pub port: u16,
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    /// How long a connection waits on a locked database.
    #[serde(default = "default_db_busy_timeout_ms")]
    pub db_busy_timeout_ms: u64,
    /// Session cookie key and JWT signing secret.
    pub secret: String,
    pub auth_service_url: String,
    /// Public base URL used in links sent to contacts.
    pub app_url: String,
    /// Bearer token cron callers must present. Cron endpoints reject every
    /// request while unset.
    #[serde(default)]
    pub cron_secret: Option<String>,
    /// Key granting access to any tenant named in `X-Tenant-Slug`.
    #[serde(default)]
    pub internal_api_key: Option<String>,
    /// Transactional email HTTP endpoint; emails are only logged when unset.
    #[serde(default)]
    pub email_api_url: Option<String>,
    #[serde(default)]
    pub email_api_key: Option<String>,
    pub email_from: String,
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    #[serde(default = "default_jobs_interval_secs")]
    pub jobs_interval_secs: u64,
}

impl ServerConfig {
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.db_max_connections,
            busy_timeout: Duration::from_millis(self.db_busy_timeout_ms),
        }
    }

    /// Reads `config/default.yaml`, the optional `config/{APP_ENV}.yaml`
    /// profile (defaults to `local`) and `APP_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

        Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{app_env}")).required(false))
            .add_source(Environment::with_prefix("APP"))
            .build()?
            .try_deserialize()
    }
}
