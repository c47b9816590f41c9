// # Arpio HTTP Client
//
// This crate provides the HTTP implementation of `ArpioClient`.
//
// ## Behavior
//
// - One HTTP request per client call
// - Every failure is propagated to the caller; there is no retry or backoff
// - HTTP timeout configured (30 seconds)
// - Specific errors for HTTP status codes (401, 403, 404, 429, 5xx)
// - Recovery point polling uses the default loop of `ArpioClient`
//
// ## Security Requirements
//
// - The API key secret NEVER appears in logs or Debug output
// - Requests authenticate with HTTP basic auth (key id / key secret)
//
// ## API Reference
//
// - List apps:             GET    `{api_url}/accounts/:account_id/apps`
// - Create app:            POST   `{api_url}/accounts/:account_id/apps`
// - Get app:               GET    `{api_url}/accounts/:account_id/apps/:app_id`
// - Update app:            PUT    `{api_url}/accounts/:account_id/apps/:app_id`
// - Delete app:            DELETE `{api_url}/accounts/:account_id/apps/:app_id`
// - List recovery points:  GET    `{api_url}/accounts/:account_id/recoveryPoints?sourceAwsAccountId=...`

use arpio_core::config::ProviderConfig;
use arpio_core::model::{App, RecoveryPoint, SyncPair};
use arpio_core::provider::Provider;
use arpio_core::traits::{ArpioClient, ArpioClientFactory, DEFAULT_POLL_INTERVAL};
use arpio_core::{Error, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body returned by the Arpio API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Arpio API client over HTTPS
///
/// Stateless apart from its configuration, which is fixed at construction.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key secret.
pub struct HttpArpioClient {
    /// API base URL, without trailing slash
    api_url: String,

    /// Arpio account ID
    account_id: String,

    /// API key ID
    api_key_id: String,

    /// API key secret
    /// ⚠️ NEVER log this value
    api_key_secret: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Delay between recovery point searches
    poll_interval: Duration,
}

// Custom Debug implementation that hides the API key secret
impl std::fmt::Debug for HttpArpioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpArpioClient")
            .field("api_url", &self.api_url)
            .field("account_id", &self.account_id)
            .field("api_key_id", &self.api_key_id)
            .field("api_key_secret", &"<REDACTED>")
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl HttpArpioClient {
    /// Create a client from validated provider configuration
    ///
    /// # Security
    ///
    /// The API key secret will NEVER be logged or displayed in error messages.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            account_id: config.account_id.clone(),
            api_key_id: config.api_key_id.clone(),
            api_key_secret: config.api_key_secret.clone(),
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Override the recovery point polling interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn apps_url(&self) -> String {
        format!("{}/accounts/{}/apps", self.api_url, self.account_id)
    }

    fn app_url(&self, app_id: &str) -> String {
        format!("{}/{}", self.apps_url(), app_id)
    }

    fn recovery_points_url(&self) -> String {
        format!("{}/accounts/{}/recoveryPoints", self.api_url, self.account_id)
    }

    /// Authenticate and send a request; only transport failures are errors here
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = if self.api_key_id.is_empty() {
            request
        } else {
            request.basic_auth(&self.api_key_id, Some(&self.api_key_secret))
        };

        request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))
    }

    /// Send a request and require a success status
    async fn send_checked(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self.send(request).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(response, what).await)
        }
    }
}

/// Map a non-success response to an error
async fn status_error(response: Response, what: &str) -> Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or(body);

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API key or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: {}", what, message)),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::api(
            status.as_u16(),
            format!("Arpio server error (transient) during {}: {}", what, message),
        ),
        code => Error::api(code, format!("{} failed: {}", what, message)),
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| Error::http(format!("Failed to parse response: {}", e)))
}

#[async_trait]
impl ArpioClient for HttpArpioClient {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    async fn list_apps(&self) -> Result<Vec<App>> {
        tracing::debug!("Listing apps in account {}", self.account_id);
        let response = self
            .send_checked(self.client.get(self.apps_url()), "list apps")
            .await?;
        parse_json(response).await
    }

    async fn get_app(&self, app_id: &str) -> Result<Option<App>> {
        tracing::debug!("Fetching app {}", app_id);
        let response = self.send(self.client.get(self.app_url(app_id))).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response, "get app").await);
        }
        parse_json(response).await.map(Some)
    }

    async fn create_app(&self, app: &App) -> Result<App> {
        tracing::debug!("Creating app {}", app.name);
        let response = self
            .send_checked(self.client.post(self.apps_url()).json(app), "create app")
            .await?;
        parse_json(response).await
    }

    async fn update_app(&self, app: &App) -> Result<App> {
        tracing::debug!("Updating app {}", app.app_id);
        let response = self
            .send_checked(
                self.client.put(self.app_url(&app.app_id)).json(app),
                "update app",
            )
            .await?;
        parse_json(response).await
    }

    async fn delete_app(&self, app_id: &str) -> Result<()> {
        tracing::debug!("Deleting app {}", app_id);
        self.send_checked(self.client.delete(self.app_url(app_id)), "delete app")
            .await?;
        Ok(())
    }

    async fn list_recovery_points(&self, sync_pair: &SyncPair) -> Result<Vec<RecoveryPoint>> {
        tracing::debug!("Listing recovery points for {}", sync_pair);
        let request = self.client.get(self.recovery_points_url()).query(&[
            ("sourceAwsAccountId", sync_pair.source.account_id.as_str()),
            ("sourceRegion", sync_pair.source.region.as_str()),
            ("targetAwsAccountId", sync_pair.target.account_id.as_str()),
            ("targetRegion", sync_pair.target.region.as_str()),
        ]);
        let response = self.send_checked(request, "list recovery points").await?;
        parse_json(response).await
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// Factory for creating HTTP Arpio clients
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientFactory;

impl ArpioClientFactory for HttpClientFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn ArpioClient>> {
        let client = HttpArpioClient::new(config)?;
        tracing::debug!("Created Arpio client for {}", client.api_url);
        Ok(Arc::new(client))
    }
}

/// Register the HTTP client with a provider
///
/// # Example
///
/// ```rust
/// use arpio_core::Provider;
///
/// let mut provider = Provider::new();
/// arpio_client_http::register(&mut provider);
/// ```
pub fn register(provider: &mut Provider) {
    provider.register_client_factory(Arc::new(HttpClientFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig::new("acct-1")
            .with_api_url("https://api.example.com/api/")
            .with_api_key("key-id", "secret_key_12345")
    }

    #[test]
    fn test_factory_creation() {
        let client = HttpClientFactory.create(&config());
        assert!(client.is_ok());
        assert_eq!(client.unwrap().account_id(), "acct-1");
    }

    #[test]
    fn test_factory_rejects_invalid_config() {
        let config = ProviderConfig::new("");
        assert!(HttpClientFactory.create(&config).is_err());
    }

    #[test]
    fn test_urls() {
        let client = HttpArpioClient::new(&config()).unwrap();
        assert_eq!(client.apps_url(), "https://api.example.com/api/accounts/acct-1/apps");
        assert_eq!(
            client.app_url("app-1"),
            "https://api.example.com/api/accounts/acct-1/apps/app-1"
        );
        assert_eq!(
            client.recovery_points_url(),
            "https://api.example.com/api/accounts/acct-1/recoveryPoints"
        );
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let client = HttpArpioClient::new(&config()).unwrap();

        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("HttpArpioClient"));
        assert!(debug_str.contains("key-id"));
    }

    #[test]
    fn test_register() {
        let mut provider = Provider::new();
        register(&mut provider);
        assert!(provider.has_resource("arpio_app"));
    }
}
