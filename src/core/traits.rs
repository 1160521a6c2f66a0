//! Core traits for talking to a secret store
//!
//! `SecretStore` is the three calls an attempt makes; `StoreConnector` builds a
//! store for one attempt from an address and an optional token. The HTTP
//! implementation lives in `crate::vault`; tests substitute scripted ones.

use super::error::FetchError;
use async_trait::async_trait;
use secrecy::SecretString;

/// Operations an attempt needs from a Vault-compatible store
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Whether the store reports itself initialized
    ///
    /// Transport failures surface as `FetchError::Unreachable`.
    async fn is_initialized(&self) -> Result<bool, FetchError>;

    /// Whether the client's credentials are accepted
    async fn is_authenticated(&self) -> Result<bool, FetchError>;

    /// Read the raw response at a logical path
    ///
    /// Returns `Ok(None)` when nothing exists at the path.
    async fn read(&self, path: &str) -> Result<Option<serde_json::Value>, FetchError>;
}

/// Factory for stores bound to an address
pub trait StoreConnector: Send + Sync {
    type Store: SecretStore;

    /// Build a store client
    ///
    /// Errors here are construction-time errors and are never retried.
    fn connect(&self, address: &str, token: Option<SecretString>)
    -> Result<Self::Store, FetchError>;
}
