use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::outbound::events::consumer::HandlerFailurePolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub broker: BrokerConfig,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub reset: ResetConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub url: String,
    pub contacts_ttl_secs: u64,
    pub max_entries: u64,
}

impl CacheConfig {
    pub fn contacts_ttl(&self) -> Duration {
        Duration::from_secs(self.contacts_ttl_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BrokerBackend {
    Kafka,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrokerConfig {
    pub backend: BrokerBackend,
    pub brokers: String,
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
    pub publish_timeout_secs: u64,
    pub reconnect: ReconnectConfig,
    pub handler: HandlerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReconnectConfig {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub max_attempts: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HandlerConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub failure_policy: HandlerFailurePolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_expiration_minutes: i64,
    pub reset_expiration_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub port: u16,
    pub sender_email: String,
    pub sender_password: String,
    pub enable_ssl: bool,
    pub notification_recipient: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResetConfig {
    /// Absolute URL the reset token is appended to as `?token=`
    pub link_base_url: String,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, BROKER__BACKEND, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: CACHE__URL=redis://... overrides cache.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
