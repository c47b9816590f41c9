// # Arpio Client Trait
//
// Defines the interface to the Arpio API used by resources and data sources.
//
// ## Implementations
//
// - HTTP: `arpio-client-http` crate
// - In-memory: `crate::client::MemoryClient` (tests, dry runs)
//
// ## Usage
//
// ```rust,ignore
// use arpio_core::ArpioClient;
//
// async fn rename(client: &dyn ArpioClient, id: &str) -> arpio_core::Result<()> {
//     if let Some(mut app) = client.get_app(id).await? {
//         app.name = "renamed".to_string();
//         client.update_app(&app).await?;
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::model::{App, RecoveryPoint, RecoveryPointQuery, SyncPair};

/// Default delay between recovery point searches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Trait for Arpio API clients
///
/// Clients are shared read-only across all operations of a configured
/// provider, so implementations must be `Send + Sync` and must not mutate
/// their configuration after construction.
///
/// Clients perform single-shot calls and surface every failure to the caller.
/// The only loop is [`ArpioClient::must_find_latest_recovery_point`], which
/// waits for a recovery point to appear.
#[async_trait]
pub trait ArpioClient: Send + Sync {
    /// The Arpio account this client acts on
    fn account_id(&self) -> &str;

    /// A blank app owned by this client's account
    fn new_app(&self) -> App {
        App::new(self.account_id())
    }

    /// List all apps in the account
    async fn list_apps(&self) -> Result<Vec<App>>;

    /// Fetch an app by id
    ///
    /// Returns `Ok(None)` when the app no longer exists.
    async fn get_app(&self, app_id: &str) -> Result<Option<App>>;

    /// Create an app; the returned copy carries the assigned id
    async fn create_app(&self, app: &App) -> Result<App>;

    /// Replace an existing app with `app`
    async fn update_app(&self, app: &App) -> Result<App>;

    /// Delete an app by id
    async fn delete_app(&self, app_id: &str) -> Result<()>;

    /// List the recovery points of a sync pair
    async fn list_recovery_points(&self, sync_pair: &SyncPair) -> Result<Vec<RecoveryPoint>>;

    /// Delay between searches while waiting for a recovery point
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Search once for the latest recovery point matching `query`
    async fn find_latest_recovery_point(
        &self,
        query: &RecoveryPointQuery,
    ) -> Result<Option<RecoveryPoint>> {
        let points = self.list_recovery_points(&query.sync_pair).await?;
        Ok(query.latest(&points).cloned())
    }

    /// Wait up to `timeout` for a recovery point inside `[timestamp_min, timestamp_max]`
    ///
    /// A zero timeout searches exactly once. When nothing is found the error
    /// names the bounds that were in effect.
    async fn must_find_latest_recovery_point(
        &self,
        sync_pair: &SyncPair,
        timestamp_min: Option<DateTime<Utc>>,
        timestamp_max: Option<DateTime<Utc>>,
        timeout: Duration,
    ) -> Result<RecoveryPoint> {
        let query = RecoveryPointQuery::new(sync_pair.clone(), timestamp_min, timestamp_max);
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(rp) = self.find_latest_recovery_point(&query).await? {
                return Ok(rp);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::not_found(query.not_found_message()));
            }

            tracing::debug!(
                "No recovery point yet for {}; retrying in {:?}",
                query.sync_pair,
                self.poll_interval().min(remaining)
            );
            tokio::time::sleep(self.poll_interval().min(remaining)).await;
        }
    }
}

/// Helper trait for constructing clients from provider configuration
pub trait ArpioClientFactory: Send + Sync {
    /// Create a client for the configured account
    fn create(&self, config: &ProviderConfig) -> Result<std::sync::Arc<dyn ArpioClient>>;
}
