//! OAuth Client Details Configuration
//!
//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub authority: AuthorityConfig,
    pub resolver: ResolverConfig,
    pub hasher: HasherConfig,
}

/// Remote client authority (system of record for client registrations)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Base URL of the authority service
    pub base_url: String,
    /// Lookup path; `{client_id}` is replaced with the url-encoded client id
    pub client_path: String,
    /// Optional bearer token sent on every lookup
    pub bearer_token: Option<String>,
    pub request_timeout_ms: u64,
    /// Transport-level retries; 0 disables retrying
    pub max_retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            client_path: "/oauth-client-details/{client_id}".to_string(),
            bearer_token: None,
            request_timeout_ms: 5000,
            max_retry_attempts: 0,
            retry_delay_ms: 500,
        }
    }
}

/// Token validity defaults applied when a client record leaves them unset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// 12 hours
    pub default_access_token_validity_secs: i64,
    /// 30 days
    pub default_refresh_token_validity_secs: i64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_access_token_validity_secs: 43_200,
            default_refresh_token_validity_secs: 2_592_000,
        }
    }
}

/// Argon2id cost parameters for client secret hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: 19_456, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Reject values the resolver cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.authority.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "authority.base_url must not be empty".to_string(),
            ));
        }
        if !self.authority.client_path.contains("{client_id}") {
            return Err(ConfigError::ValidationError(
                "authority.client_path must contain the {client_id} placeholder".to_string(),
            ));
        }
        if self.authority.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "authority.request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.resolver.default_access_token_validity_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "resolver.default_access_token_validity_secs must be positive".to_string(),
            ));
        }
        if self.resolver.default_refresh_token_validity_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "resolver.default_refresh_token_validity_secs must be positive".to_string(),
            ));
        }
        if self.hasher.time_cost == 0 || self.hasher.parallelism == 0 {
            return Err(ConfigError::ValidationError(
                "hasher.time_cost and hasher.parallelism must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# OAuth Client Details Configuration
# Environment variables (OAUTH_CLIENTS_*) override these settings

[authority]
base_url = "http://localhost:8080"
client_path = "/oauth-client-details/{client_id}"
# bearer_token = ""
request_timeout_ms = 5000
max_retry_attempts = 0
retry_delay_ms = 500

[resolver]
default_access_token_validity_secs = 43200     # 12 hours
default_refresh_token_validity_secs = 2592000  # 30 days

[hasher]
memory_cost_kib = 19456
time_cost = 2
parallelism = 1
"#
        .to_string()
    }
}
