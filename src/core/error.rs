//! Error handling for secret fetching
//!
//! Every failure the fetcher can observe is a `FetchError` variant. The retry
//! loop decides what to do next from the variant alone.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for secret fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    // Token errors
    #[error("Token file {} is not usable: {reason}", path.display())]
    ConfigAbsent { path: PathBuf, reason: String },

    // Store errors
    #[error("Vault proxy not reachable: {message}")]
    Unreachable { message: String },

    #[error("Not authenticated with Vault proxy")]
    Unauthenticated,

    #[error("Secret not found at {path}")]
    SecretMissing { path: String },

    #[error("Permission denied reading {path}")]
    PermissionDenied { path: String },

    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse { endpoint: String, message: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FetchError {
    pub(crate) fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }

    /// Check if this error is transient and worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unreachable { .. } | Self::Unauthenticated | Self::SecretMissing { .. }
        )
    }

    /// Whether this error is followed by the authentication cooldown
    pub fn needs_cooldown(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::ConfigAbsent { .. } => vec![
                "Check that the token file exists and is readable",
                "Set VAULT_TOKEN_PATH if the token lives elsewhere",
            ],
            Self::Unreachable { .. } => vec![
                "Check that the Vault proxy is running",
                "Verify VAULT_PROXY_ADDR",
                "Check that the Vault server is initialized and unsealed",
            ],
            Self::Unauthenticated => vec![
                "Check that the token is valid and not expired",
                "Check the proxy auto-auth configuration",
            ],
            Self::SecretMissing { .. } => vec![
                "Verify SECRET_PATH",
                "KV v2 paths need the data/ segment (e.g. secret/data/appset)",
            ],
            Self::PermissionDenied { .. } => {
                vec!["Check the token policy grants read on the secret path"]
            }
            Self::UnexpectedResponse { .. } => {
                vec!["Check that VAULT_PROXY_ADDR points at a Vault-compatible API"]
            }
            Self::InvalidConfig(_) => vec!["Fix the configuration value and retry"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigAbsent { .. } => "CONFIG_ABSENT",
            Self::Unreachable { .. } => "UNREACHABLE",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::SecretMissing { .. } => "SECRET_MISSING",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::UnexpectedResponse { .. } => "UNEXPECTED_RESPONSE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}
