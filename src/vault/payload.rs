//! Typed secret payload decoded from a KV v2 read response
//!
//! A KV v2 read answers with the secret nested twice:
//!
//! ```json
//! { "data": { "data": { "user": "svc" }, "metadata": { "version": 3 } } }
//! ```
//!
//! Anything without a non-empty `data.data` object is treated as a missing
//! secret, since the store may still be converging.

use crate::core::FetchError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Deserialize)]
struct KvReadResponse {
    data: KvReadData,
}

#[derive(Debug, Deserialize)]
struct KvReadData {
    data: BTreeMap<String, Value>,
}

/// Secret key/value pairs, ordered by key
pub struct SecretPayload {
    entries: BTreeMap<String, SecretString>,
}

impl SecretPayload {
    /// Decode a raw read response
    ///
    /// String values are kept verbatim; other JSON values keep their compact
    /// JSON text.
    pub fn from_response(path: &str, response: Value) -> Result<Self, FetchError> {
        let missing = || FetchError::SecretMissing {
            path: path.to_string(),
        };

        let decoded: KvReadResponse = serde_json::from_value(response).map_err(|e| {
            tracing::debug!(path, error = %e, "read response has no nested data");
            missing()
        })?;

        if decoded.data.data.is_empty() {
            return Err(missing());
        }

        let entries = decoded
            .data
            .data
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, SecretString::new(text.into()))
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up one value
    pub fn get(&self, key: &str) -> Option<&SecretString> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretString)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Expose every value as a plain map
    pub fn expose(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.expose_secret().to_string()))
            .collect()
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
