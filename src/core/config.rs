//! Configuration for the secret fetcher
//!
//! `FetcherConfig` is built once at startup and passed by reference. Values are
//! layered with the following priority (high to low):
//! 1. CLI arguments (`ConfigOverrides`)
//! 2. Environment variables
//! 3. Default values

use super::error::FetchError;
use super::retry::DEFAULT_AUTH_COOLDOWN;
use reqwest::Url;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TOKEN_PATH: &str = "/tmp/vault_token";
pub const DEFAULT_PROXY_ADDRESS: &str = "http://vault-proxy:8100";
pub const DEFAULT_SECRET_PATH: &str = "secret/data/appset";

pub const ENV_TOKEN_PATH: &str = "VAULT_TOKEN_PATH";
pub const ENV_PROXY_ADDRESS: &str = "VAULT_PROXY_ADDR";
pub const ENV_SECRET_PATH: &str = "SECRET_PATH";
pub const ENV_REQUEST_TIMEOUT: &str = "VAULT_REQUEST_TIMEOUT_SECS";

/// Fetcher configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    /// File containing the bearer token
    pub token_path: PathBuf,

    /// Base URL of the secret-store proxy
    pub proxy_address: String,

    /// Logical path of the secret to read
    pub secret_path: String,

    /// Pause after an authentication failure
    pub auth_cooldown: Duration,

    /// Per-request timeout (none: wait for the store)
    pub request_timeout: Option<Duration>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            proxy_address: DEFAULT_PROXY_ADDRESS.to_string(),
            secret_path: DEFAULT_SECRET_PATH.to_string(),
            auth_cooldown: DEFAULT_AUTH_COOLDOWN,
            request_timeout: None,
        }
    }
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub token_path: Option<PathBuf>,
    pub proxy_address: Option<String>,
    pub secret_path: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl FetcherConfig {
    /// Defaults overlaid with the given environment
    pub fn from_env(env: &HashMap<String, String>) -> Result<Self, FetchError> {
        let mut config = Self::default();

        if let Some(path) = non_empty(env, ENV_TOKEN_PATH) {
            config.token_path = PathBuf::from(path);
        }
        if let Some(address) = non_empty(env, ENV_PROXY_ADDRESS) {
            config.proxy_address = address.to_string();
        }
        if let Some(path) = non_empty(env, ENV_SECRET_PATH) {
            config.secret_path = path.to_string();
        }
        if let Some(secs) = non_empty(env, ENV_REQUEST_TIMEOUT) {
            let secs: u64 = secs.parse().map_err(|_| {
                FetchError::InvalidConfig(format!(
                    "{} must be a whole number of seconds, got {:?}",
                    ENV_REQUEST_TIMEOUT, secs
                ))
            })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Defaults overlaid with the process environment
    pub fn from_process_env() -> Result<Self, FetchError> {
        Self::from_env(&std::env::vars().collect())
    }

    /// Apply command-line values on top of this configuration
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(path) = overrides.token_path {
            self.token_path = path;
        }
        if let Some(address) = overrides.proxy_address {
            self.proxy_address = address;
        }
        if let Some(path) = overrides.secret_path {
            self.secret_path = path;
        }
        if overrides.request_timeout.is_some() {
            self.request_timeout = overrides.request_timeout;
        }
        self
    }

    /// Check the configuration before any attempt is made
    pub fn validate(&self) -> Result<(), FetchError> {
        let url = Url::parse(&self.proxy_address).map_err(|e| {
            FetchError::InvalidConfig(format!(
                "proxy address {:?} is not a valid URL: {}",
                self.proxy_address, e
            ))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidConfig(format!(
                "proxy address {:?} must use http or https",
                self.proxy_address
            )));
        }

        if self.secret_path.trim_matches('/').trim().is_empty() {
            return Err(FetchError::InvalidConfig(
                "secret path must not be empty".to_string(),
            ));
        }

        if self.token_path.as_os_str().is_empty() {
            return Err(FetchError::InvalidConfig(
                "token path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn non_empty<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}
