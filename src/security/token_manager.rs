//! Token file handling with memory-safe storage and masking
//!
//! The bearer token is read from a file written by a sidecar or init container
//! and held as a `SecretString` so it never shows up in logs or debug output.

use crate::core::FetchError;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Reads the bearer token from a file
///
/// # Examples
///
/// ```no_run
/// use vault_fetch::security::TokenFile;
///
/// # async fn run() {
/// let token_file = TokenFile::new("/tmp/vault_token");
/// match token_file.read().await {
///     Ok(_token) => println!("token loaded"),
///     Err(e) => println!("continuing without token: {}", e),
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and trim the token
    ///
    /// An unreadable or blank file is `FetchError::ConfigAbsent`, as is a
    /// token that cannot be sent in an HTTP header.
    pub async fn read(&self) -> Result<SecretString, FetchError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::ConfigAbsent {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let token = content.trim();
        if token.is_empty() {
            return Err(FetchError::ConfigAbsent {
                path: self.path.clone(),
                reason: "file is empty".to_string(),
            });
        }

        if HeaderValue::from_str(token).is_err() {
            return Err(FetchError::ConfigAbsent {
                path: self.path.clone(),
                reason: "token contains characters not allowed in an HTTP header".to_string(),
            });
        }

        Ok(SecretString::new(token.to_string().into()))
    }

    /// Read the token, degrading any failure to an absent token
    pub async fn read_optional(&self) -> Option<SecretString> {
        match self.read().await {
            Ok(token) => {
                tracing::debug!(
                    path = %self.path.display(),
                    token = %mask_token(token.expose_secret()),
                    "loaded vault token"
                );
                Some(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "proceeding without a vault token");
                None
            }
        }
    }
}

/// Masks a token for safe logging
///
/// Shows only the first 3 and last 3 characters for identification purposes.
/// Tokens shorter than 10 characters are fully masked as "****".
///
/// # Examples
///
/// ```
/// use vault_fetch::security::mask_token;
///
/// assert_eq!(mask_token("hvs.abcdef123456"), "hvs...456");
/// assert_eq!(mask_token("short"), "****");
/// ```
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }

    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[chars.len() - 3..].iter().collect();
    format!("{}...{}", prefix, suffix)
}
