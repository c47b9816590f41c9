// # Memory Client
//
// In-memory implementation of ArpioClient.
//
// ## Purpose
//
// Provides a self-contained stand-in for the Arpio API. Apps and recovery
// points live in maps protected by a RwLock and vanish when the client is
// dropped.
//
// ## When to Use
//
// - Testing resources and data sources without network access
// - Dry runs of the provider driver
//
// Clones share the same store, so a test can keep one handle and give
// another to the provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::ProviderConfig;
use crate::model::{App, RecoveryPoint, SyncPair};
use crate::traits::client::{ArpioClient, ArpioClientFactory};
use crate::{Error, Result};

/// Default delay between recovery point searches for the memory client
const MEMORY_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct Store {
    apps: HashMap<String, App>,
    recovery_points: Vec<RecoveryPoint>,
}

/// In-memory Arpio client
///
/// # Example
///
/// ```rust,no_run
/// use arpio_core::client::MemoryClient;
/// use arpio_core::traits::ArpioClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = MemoryClient::new("acct-1");
///
///     let mut app = client.new_app();
///     app.name = "site".to_string();
///     let created = client.create_app(&app).await?;
///
///     assert!(client.get_app(&created.app_id).await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryClient {
    account_id: String,
    inner: Arc<RwLock<Store>>,
    next_id: Arc<AtomicU64>,
    poll_interval: Duration,
}

impl MemoryClient {
    /// Create a new empty client for an Arpio account
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            inner: Arc::new(RwLock::new(Store::default())),
            next_id: Arc::new(AtomicU64::new(1)),
            poll_interval: MEMORY_POLL_INTERVAL,
        }
    }

    /// Override the recovery point polling interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Insert an app directly, bypassing id assignment
    ///
    /// An empty `app_id` is replaced by a generated one. Returns the id.
    pub async fn insert_app(&self, mut app: App) -> String {
        if app.app_id.is_empty() {
            app.app_id = self.generate_id("app");
        }
        let id = app.app_id.clone();
        self.inner.write().await.apps.insert(id.clone(), app);
        id
    }

    /// Record a recovery point
    pub async fn add_recovery_point(&self, rp: RecoveryPoint) {
        self.inner.write().await.recovery_points.push(rp);
    }

    /// Number of apps in the store
    pub async fn app_count(&self) -> usize {
        self.inner.read().await.apps.len()
    }

    /// Remove everything from the store
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        guard.apps.clear();
        guard.recovery_points.clear();
    }

    fn generate_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl ArpioClient for MemoryClient {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    async fn list_apps(&self) -> Result<Vec<App>> {
        let guard = self.inner.read().await;
        let mut apps: Vec<App> = guard.apps.values().cloned().collect();
        apps.sort_by(|a, b| a.app_id.cmp(&b.app_id));
        Ok(apps)
    }

    async fn get_app(&self, app_id: &str) -> Result<Option<App>> {
        let guard = self.inner.read().await;
        Ok(guard.apps.get(app_id).cloned())
    }

    async fn create_app(&self, app: &App) -> Result<App> {
        let mut created = app.clone();
        created.app_id = self.generate_id("app");
        if created.account_id.is_empty() {
            created.account_id = self.account_id.clone();
        }

        let mut guard = self.inner.write().await;
        guard.apps.insert(created.app_id.clone(), created.clone());
        Ok(created)
    }

    async fn update_app(&self, app: &App) -> Result<App> {
        let mut guard = self.inner.write().await;
        match guard.apps.get_mut(&app.app_id) {
            Some(existing) => {
                *existing = app.clone();
                Ok(existing.clone())
            }
            None => Err(Error::not_found(format!("app {} does not exist", app.app_id))),
        }
    }

    async fn delete_app(&self, app_id: &str) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard
            .apps
            .remove(app_id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("app {} does not exist", app_id)))
    }

    async fn list_recovery_points(&self, sync_pair: &SyncPair) -> Result<Vec<RecoveryPoint>> {
        let guard = self.inner.read().await;
        Ok(guard
            .recovery_points
            .iter()
            .filter(|rp| &rp.sync_pair() == sync_pair)
            .cloned()
            .collect())
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// Factory handing out clones of one shared memory client
#[derive(Debug, Clone)]
pub struct MemoryClientFactory {
    client: MemoryClient,
}

impl MemoryClientFactory {
    pub fn new(client: MemoryClient) -> Self {
        Self { client }
    }
}

impl ArpioClientFactory for MemoryClientFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn ArpioClient>> {
        if config.account_id != self.client.account_id {
            return Err(Error::config(format!(
                "memory client serves account {}, not {}",
                self.client.account_id, config.account_id
            )));
        }
        Ok(Arc::new(self.client.clone()))
    }
}
