//! HTTP client for a Vault-compatible proxy
//!
//! Uses the Vault HTTP API v1:
//! - `GET /v1/sys/init` for reachability
//! - `GET /v1/auth/token/lookup-self` for authentication
//! - `GET /v1/<path>` for the secret read

use crate::core::{FetchError, SecretStore, StoreConnector};
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

const TOKEN_HEADER: &str = "X-Vault-Token";
const REQUEST_HEADER: &str = "X-Vault-Request";

const INIT_ENDPOINT: &str = "sys/init";
const LOOKUP_SELF_ENDPOINT: &str = "auth/token/lookup-self";

#[derive(Debug, Deserialize)]
struct InitStatus {
    initialized: bool,
}

/// Client bound to one proxy address and an optional token
#[derive(Debug)]
pub struct VaultClient {
    http: Client,
    base_url: Url,
    token: Option<HeaderValue>,
}

impl VaultClient {
    /// Create a client
    ///
    /// Fails with `FetchError::InvalidConfig` when the address is not an
    /// http(s) URL or the token cannot be sent as a header.
    pub fn new(
        address: &str,
        token: Option<SecretString>,
        request_timeout: Option<Duration>,
    ) -> Result<Self, FetchError> {
        let mut base_url = Url::parse(address).map_err(|e| {
            FetchError::InvalidConfig(format!("proxy address {:?}: {}", address, e))
        })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidConfig(format!(
                "proxy address {:?} must use http or https",
                address
            )));
        }

        // Keep any path prefix when joining endpoints
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let token = token
            .map(|token| {
                let mut value = HeaderValue::from_str(token.expose_secret()).map_err(|_| {
                    FetchError::InvalidConfig(
                        "token contains characters not allowed in a header".to_string(),
                    )
                })?;
                value.set_sensitive(true);
                Ok::<_, FetchError>(value)
            })
            .transpose()?;

        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            FetchError::InvalidConfig(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Base URL every endpoint is joined onto
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(&format!("v1/{}", path.trim_start_matches('/')))
            .map_err(|e| FetchError::InvalidConfig(format!("endpoint {:?}: {}", path, e)))
    }

    async fn get(&self, path: &str) -> Result<Response, FetchError> {
        let url = self.endpoint(path)?;

        let mut request = self.http.get(url).header(REQUEST_HEADER, "true");
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token.clone());
        }

        request.send().await.map_err(|e| {
            if e.is_builder() {
                FetchError::InvalidConfig(format!("request to {}: {}", path, e))
            } else {
                FetchError::unreachable(e.to_string())
            }
        })
    }
}

/// Error for a status the caller has no specific handling for
///
/// Server-side failures (including a sealed store's 503) and throttling stay
/// retryable; anything else means the address is not speaking the Vault API.
fn status_error(endpoint: &str, status: StatusCode) -> FetchError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        FetchError::unreachable(format!("{} returned {}", endpoint, status))
    } else {
        FetchError::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            message: format!("status {}", status),
        }
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn is_initialized(&self) -> Result<bool, FetchError> {
        let response = self.get(INIT_ENDPOINT).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(INIT_ENDPOINT, status));
        }

        // A proxy that is still starting may answer with a placeholder page
        let init: InitStatus = response.json().await.map_err(|e| {
            FetchError::unreachable(format!(
                "{} returned an undecodable body: {}",
                INIT_ENDPOINT, e
            ))
        })?;
        Ok(init.initialized)
    }

    async fn is_authenticated(&self) -> Result<bool, FetchError> {
        let response = self.get(LOOKUP_SELF_ENDPOINT).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            // 400 is the answer to a request without a token
            StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(LOOKUP_SELF_ENDPOINT, status)),
        }
    }

    async fn read(&self, path: &str) -> Result<Option<serde_json::Value>, FetchError> {
        let response = self.get(path).await?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(None),
            StatusCode::FORBIDDEN => Err(FetchError::PermissionDenied {
                path: path.to_string(),
            }),
            status if status.is_success() => match response.json().await {
                Ok(body) => Ok(Some(body)),
                Err(e) => {
                    tracing::debug!(path, error = %e, "Secret body is not JSON, treating as absent");
                    Ok(None)
                }
            },
            status => Err(status_error(path, status)),
        }
    }
}

/// Connector producing `VaultClient`s over HTTP
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    request_timeout: Option<Duration>,
}

impl HttpConnector {
    pub fn new(request_timeout: Option<Duration>) -> Self {
        Self { request_timeout }
    }
}

impl StoreConnector for HttpConnector {
    type Store = VaultClient;

    fn connect(
        &self,
        address: &str,
        token: Option<SecretString>,
    ) -> Result<Self::Store, FetchError> {
        VaultClient::new(address, token, self.request_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn token(value: &str) -> Option<SecretString> {
        Some(SecretString::new(value.to_string().into()))
    }

    #[test]
    fn test_new_rejects_malformed_address() {
        let error = VaultClient::new("vault-proxy:8100:x", None, None).unwrap_err();
        assert_eq!(error.code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_new_rejects_non_http_scheme() {
        let result = VaultClient::new("unix:///var/run/vault.sock", None, None);
        assert!(matches!(result, Err(FetchError::InvalidConfig(_))));
    }

    #[test]
    fn test_new_rejects_token_with_control_characters() {
        let result = VaultClient::new("http://vault-proxy:8100", token("bad\ttoken\u{7f}"), None);
        assert!(matches!(result, Err(FetchError::InvalidConfig(_))));
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let client = VaultClient::new("http://proxy.local/vault", None, None).unwrap();

        assert_eq!(
            client.endpoint("sys/init").unwrap().as_str(),
            "http://proxy.local/vault/v1/sys/init"
        );
        assert_eq!(
            client.endpoint("/secret/data/appset").unwrap().as_str(),
            "http://proxy.local/vault/v1/secret/data/appset"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let client = VaultClient::new("http://vault-proxy:8100", token("hvs.supersecret"), None)
            .unwrap();

        assert!(client.has_token());
        assert!(!format!("{:?}", client).contains("supersecret"));
    }

    #[tokio::test]
    async fn test_is_initialized_sends_token_and_request_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/sys/init")
            .match_header("x-vault-token", "hvs.test-token")
            .match_header("x-vault-request", "true")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "initialized": true }).to_string())
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), token("hvs.test-token"), None).unwrap();

        assert!(client.is_initialized().await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_is_initialized_false() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/sys/init")
            .with_status(200)
            .with_body(json!({ "initialized": false }).to_string())
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), None, None).unwrap();

        assert!(!client.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn test_sealed_store_is_unreachable() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/sys/init")
            .with_status(503)
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), None, None).unwrap();

        let error = client.is_initialized().await.unwrap_err();
        assert!(matches!(error, FetchError::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let client = VaultClient::new("http://127.0.0.1:1", None, None).unwrap();

        let error = client.is_initialized().await.unwrap_err();
        assert!(error.is_retryable());
        assert_eq!(error.code(), "UNREACHABLE");
    }

    #[tokio::test]
    async fn test_garbage_init_body_is_unreachable() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/sys/init")
            .with_status(200)
            .with_body("<html>not vault</html>")
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), None, None).unwrap();

        let error = client.is_initialized().await.unwrap_err();
        assert_eq!(error.code(), "UNREACHABLE");
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn test_is_authenticated() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/auth/token/lookup-self")
            .match_header("x-vault-token", "hvs.good")
            .with_status(200)
            .with_body(json!({ "data": { "ttl": 3600 } }).to_string())
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), token("hvs.good"), None).unwrap();

        assert!(client.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_token_is_not_authenticated() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/auth/token/lookup-self")
            .with_status(403)
            .with_body(json!({ "errors": ["permission denied"] }).to_string())
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), token("hvs.expired"), None).unwrap();

        assert!(!client.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_client_token_is_not_authenticated() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/auth/token/lookup-self")
            .match_header("x-vault-token", Matcher::Missing)
            .with_status(400)
            .with_body(json!({ "errors": ["missing client token"] }).to_string())
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), None, None).unwrap();

        assert!(!client.is_authenticated().await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_lookup_path_is_not_authenticated() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/auth/token/lookup-self")
            .with_status(404)
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), token("hvs.good"), None).unwrap();

        assert!(!client.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_absent_token_sends_no_token_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/auth/token/lookup-self")
            .match_header("x-vault-token", Matcher::Missing)
            .with_status(200)
            .with_body(json!({ "data": {} }).to_string())
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), None, None).unwrap();

        // The proxy may authenticate with its own auto-auth token
        assert!(client.is_authenticated().await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_returns_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/secret/data/appset")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "data": { "data": { "user": "svc" } } }).to_string())
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), token("hvs.good"), None).unwrap();

        let body = client.read("secret/data/appset").await.unwrap().unwrap();
        assert_eq!(body["data"]["data"]["user"], "svc");
    }

    #[tokio::test]
    async fn test_read_not_found_is_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/secret/data/appset")
            .with_status(404)
            .with_body(json!({ "errors": [] }).to_string())
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), token("hvs.good"), None).unwrap();

        assert!(client.read("secret/data/appset").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_non_json_body_is_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/secret/data/appset")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>warming up</html>")
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), token("hvs.good"), None).unwrap();

        assert!(client.read("secret/data/appset").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_forbidden_is_permission_denied() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/secret/data/appset")
            .with_status(403)
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), token("hvs.good"), None).unwrap();

        let error = client.read("secret/data/appset").await.unwrap_err();
        assert!(matches!(error, FetchError::PermissionDenied { .. }));
        assert!(!error.is_retryable());
    }

    #[tokio::test]
    async fn test_read_unexpected_status() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/secret/data/appset")
            .with_status(418)
            .create_async()
            .await;

        let client = VaultClient::new(&server.url(), token("hvs.good"), None).unwrap();

        let error = client.read("secret/data/appset").await.unwrap_err();
        assert_eq!(error.code(), "UNEXPECTED_RESPONSE");
    }

    #[test]
    fn test_connector_builds_client() {
        let connector = HttpConnector::new(Some(Duration::from_secs(5)));

        let client = connector
            .connect("http://vault-proxy:8100", token("hvs.x"))
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://vault-proxy:8100/");
        assert!(connector.connect("::::", None).is_err());
    }
}
