//! Secret fetcher
//!
//! Each attempt reads the token file, builds a client for the proxy, checks
//! that the store is reachable and the client authenticated, then reads the
//! secret. Failures go through `RetryManager`, which decides from the error
//! kind whether another attempt follows.

use crate::core::{
    FetchError, FetcherConfig, RetryManager, RetryOptions, RetryOutcome, SecretStore,
    StoreConnector,
};
use crate::security::TokenFile;
use crate::vault::{HttpConnector, SecretPayload};
use std::time::Duration;

/// Fetches one secret through a Vault proxy with bounded retry
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use vault_fetch::{FetcherConfig, SecretFetcher};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = FetcherConfig::from_process_env()?;
///     let fetcher = SecretFetcher::new(config);
///
///     let secrets = fetcher.fetch(5, Duration::from_secs(2)).await?;
///     for (key, _value) in secrets.iter() {
///         println!("{}", key);
///     }
///     Ok(())
/// }
/// ```
pub struct SecretFetcher<C = HttpConnector> {
    config: FetcherConfig,
    connector: C,
}

impl SecretFetcher<HttpConnector> {
    /// Create a fetcher talking HTTP to the configured proxy
    pub fn new(config: FetcherConfig) -> Self {
        let connector = HttpConnector::new(config.request_timeout);
        Self { config, connector }
    }
}

impl<C: StoreConnector> SecretFetcher<C> {
    /// Create a fetcher with a custom store connector
    pub fn with_connector(config: FetcherConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch the configured secret
    ///
    /// Makes up to `max_attempts` attempts, sleeping `delay` between them.
    /// After the last attempt its error is returned unchanged.
    pub async fn fetch(
        &self,
        max_attempts: u32,
        delay: Duration,
    ) -> Result<SecretPayload, FetchError> {
        self.fetch_with_history(max_attempts, delay).await.result
    }

    /// Like `fetch`, also returning the state transitions of the run
    pub async fn fetch_with_history(
        &self,
        max_attempts: u32,
        delay: Duration,
    ) -> RetryOutcome<SecretPayload, FetchError> {
        if max_attempts == 0 {
            return RetryOutcome {
                result: Err(FetchError::InvalidConfig(
                    "max attempts must be at least 1".to_string(),
                )),
                history: Vec::new(),
            };
        }

        if let Err(e) = self.config.validate() {
            return RetryOutcome {
                result: Err(e),
                history: Vec::new(),
            };
        }

        let manager = RetryManager::new(RetryOptions {
            max_attempts,
            delay,
            cooldown: self.config.auth_cooldown,
        });
        let token_file = TokenFile::new(&self.config.token_path);

        tracing::info!(
            proxy = %self.config.proxy_address,
            path = %self.config.secret_path,
            max_attempts,
            "fetching secret"
        );

        manager
            .retry_with_history(|attempt| self.attempt(&token_file, attempt))
            .await
    }

    #[tracing::instrument(level = "debug", skip(self, token_file))]
    async fn attempt(
        &self,
        token_file: &TokenFile,
        attempt: u32,
    ) -> Result<SecretPayload, FetchError> {
        let token = token_file.read_optional().await;
        let store = self.connector.connect(&self.config.proxy_address, token)?;

        if !store.is_initialized().await? {
            return Err(FetchError::unreachable("store reports it is not initialized"));
        }

        if !store.is_authenticated().await? {
            return Err(FetchError::Unauthenticated);
        }

        let path = self.config.secret_path.trim_start_matches('/');
        let response = store
            .read(path)
            .await?
            .ok_or_else(|| FetchError::SecretMissing {
                path: path.to_string(),
            })?;

        let payload = SecretPayload::from_response(path, response)?;
        tracing::info!(attempt, keys = payload.len(), "secret retrieved");
        Ok(payload)
    }
}
