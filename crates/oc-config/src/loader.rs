//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "oauth-clients.toml",
    "config.toml",
    "./config/oauth-clients.toml",
    "/etc/oauth-clients/config.toml",
];

/// Environment variable pointing at an explicit config file
const CONFIG_PATH_VAR: &str = "OAUTH_CLIENTS_CONFIG";

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env: EnvLookup,
}

impl ConfigLoader {
    /// Create a new configuration loader reading the process environment
    pub fn new() -> Self {
        Self {
            config_path: None,
            env: Box::new(|key| env::var(key).ok()),
        }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
            ..Self::new()
        }
    }

    /// Replace the environment lookup used for `OAUTH_CLIENTS_CONFIG` and
    /// the `OAUTH_CLIENTS_*` overrides
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    /// Load configuration from file (if found), apply environment overrides, then validate
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match self.find_config_file() {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                AppConfig::from_file(&path)?
            }
            None => AppConfig::default(),
        };

        apply_overrides(&mut config, |key| (self.env)(key));
        config.validate()?;

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        // Explicit paths are not existence-checked; a missing file fails the read.
        if let Some(path) = &self.config_path {
            return Some(path.clone());
        }

        if let Some(path) = (self.env)(CONFIG_PATH_VAR) {
            return Some(PathBuf::from(path));
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `OAUTH_CLIENTS_*` overrides read through `lookup`.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Authority
    if let Some(val) = lookup("OAUTH_CLIENTS_AUTHORITY_URL") {
        config.authority.base_url = val;
    }
    if let Some(val) = lookup("OAUTH_CLIENTS_AUTHORITY_PATH") {
        config.authority.client_path = val;
    }
    if let Some(val) = lookup("OAUTH_CLIENTS_AUTHORITY_TOKEN") {
        config.authority.bearer_token = if val.is_empty() { None } else { Some(val) };
    }
    parse_into(&lookup, "OAUTH_CLIENTS_AUTHORITY_TIMEOUT_MS", &mut config.authority.request_timeout_ms);
    parse_into(&lookup, "OAUTH_CLIENTS_AUTHORITY_MAX_RETRIES", &mut config.authority.max_retry_attempts);
    parse_into(&lookup, "OAUTH_CLIENTS_AUTHORITY_RETRY_DELAY_MS", &mut config.authority.retry_delay_ms);

    // Resolver
    parse_into(
        &lookup,
        "OAUTH_CLIENTS_ACCESS_TOKEN_VALIDITY_SECS",
        &mut config.resolver.default_access_token_validity_secs,
    );
    parse_into(
        &lookup,
        "OAUTH_CLIENTS_REFRESH_TOKEN_VALIDITY_SECS",
        &mut config.resolver.default_refresh_token_validity_secs,
    );

    // Hasher
    parse_into(&lookup, "OAUTH_CLIENTS_HASHER_MEMORY_KIB", &mut config.hasher.memory_cost_kib);
    parse_into(&lookup, "OAUTH_CLIENTS_HASHER_TIME_COST", &mut config.hasher.time_cost);
    parse_into(&lookup, "OAUTH_CLIENTS_HASHER_PARALLELISM", &mut config.hasher.parallelism);
}

fn parse_into<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(val) = lookup(key) {
        match val.trim().parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key, value = %val, "Ignoring unparseable environment override"),
        }
    }
}
