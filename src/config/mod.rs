use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Prefix of every environment variable read by the service
pub const ENV_PREFIX: &str = "STOREFRONT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub aws: AwsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: u64,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_products_table")]
    pub products_table_name: String,
    #[serde(default = "default_carts_table")]
    pub carts_table_name: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Points the client at DynamoDB Local or another compatible endpoint
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub auto_create_tables: bool,
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub dynamodb_client: DynamoDbClient,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_json_logging: bool,
}

impl Config {
    pub async fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");

        let server = ServerConfig::from_env()?;
        let database = DatabaseConfig::from_env()?;
        let observability = ObservabilityConfig::from_env()?;

        validate_settings(&server, &database)?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(database.region.clone()));
        if let Some(endpoint_url) = &database.endpoint_url {
            info!("Using DynamoDB endpoint override: {}", endpoint_url);
            loader = loader.endpoint_url(endpoint_url);
        }
        let sdk_config = loader.load().await;

        let aws = AwsConfig {
            region: database.region.clone(),
            dynamodb_client: DynamoDbClient::new(&sdk_config),
        };

        let config = Config {
            server,
            database,
            aws,
            observability,
        };

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_settings(&self.server, &self.database)
    }
}

pub(crate) fn validate_settings(
    server: &ServerConfig,
    database: &DatabaseConfig,
) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::ValidationError {
            message: "Server port cannot be 0".to_string(),
        });
    }

    if server.request_timeout_seconds == 0 {
        return Err(ConfigError::ValidationError {
            message: "Request timeout cannot be 0".to_string(),
        });
    }

    if database.products_table_name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            message: "Products table name cannot be empty".to_string(),
        });
    }

    if database.carts_table_name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            message: "Carts table name cannot be empty".to_string(),
        });
    }

    Ok(())
}

/// Deserialize one configuration section from an environment source
pub(crate) fn load_section<T: DeserializeOwned>(
    section: &str,
    source: config::Environment,
) -> Result<T, ConfigError> {
    let settings = config::Config::builder()
        .add_source(source)
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load {} config: {}", section, e),
        })?;

    settings
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", section, e),
        })
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_section("server", environment())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_section("database", environment())
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_section("observability", environment())
    }
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_max_request_size() -> u64 {
    1024 * 1024 // 1MB
}

pub(crate) fn default_static_dir() -> String {
    "public".to_string()
}

pub(crate) fn default_products_table() -> String {
    "StorefrontProducts".to_string()
}

pub(crate) fn default_carts_table() -> String {
    "StorefrontCarts".to_string()
}

pub(crate) fn default_region() -> String {
    "us-west-2".to_string()
}

pub(crate) fn default_service_name() -> String {
    "storefront-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
