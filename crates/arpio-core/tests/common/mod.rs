//! Test doubles and common utilities for provider contract tests
//!
//! Every test builds its own [`TestHarness`]; nothing is shared between
//! tests. The harness wraps a [`MemoryClient`] in a [`CountingClient`] so
//! tests can assert which remote calls an operation made.

#![allow(dead_code)]

use arpio_core::attr::{AttrMap, AttrValue};
use arpio_core::error::Result;
use arpio_core::model::{App, RecoveryPoint, SyncPair};
use arpio_core::traits::ArpioClient;
use arpio_core::{MemoryClient, Provider, ProviderMeta, ResourceData};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const ACCOUNT_ID: &str = "acct-test";
pub const SOURCE_ACCOUNT: &str = "111111111111";
pub const SOURCE_REGION: &str = "us-east-1";
pub const TARGET_ACCOUNT: &str = "222222222222";
pub const TARGET_REGION: &str = "us-west-2";

/// Per-method call counters
#[derive(Debug, Default)]
pub struct CallCounts {
    pub list_apps: AtomicUsize,
    pub get_app: AtomicUsize,
    pub create_app: AtomicUsize,
    pub update_app: AtomicUsize,
    pub delete_app: AtomicUsize,
    pub list_recovery_points: AtomicUsize,
}

impl CallCounts {
    /// Total number of remote calls
    pub fn total(&self) -> usize {
        [
            &self.list_apps,
            &self.get_app,
            &self.create_app,
            &self.update_app,
            &self.delete_app,
            &self.list_recovery_points,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    /// Number of mutating calls
    pub fn mutations(&self) -> usize {
        self.create_app.load(Ordering::SeqCst)
            + self.update_app.load(Ordering::SeqCst)
            + self.delete_app.load(Ordering::SeqCst)
    }
}

/// An ArpioClient that counts calls before delegating to a MemoryClient
pub struct CountingClient {
    inner: MemoryClient,
    counts: Arc<CallCounts>,
}

impl CountingClient {
    pub fn new(inner: MemoryClient) -> Self {
        Self {
            inner,
            counts: Arc::new(CallCounts::default()),
        }
    }

    pub fn counts(&self) -> Arc<CallCounts> {
        Arc::clone(&self.counts)
    }
}

#[async_trait]
impl ArpioClient for CountingClient {
    fn account_id(&self) -> &str {
        self.inner.account_id()
    }

    async fn list_apps(&self) -> Result<Vec<App>> {
        self.counts.list_apps.fetch_add(1, Ordering::SeqCst);
        self.inner.list_apps().await
    }

    async fn get_app(&self, app_id: &str) -> Result<Option<App>> {
        self.counts.get_app.fetch_add(1, Ordering::SeqCst);
        self.inner.get_app(app_id).await
    }

    async fn create_app(&self, app: &App) -> Result<App> {
        self.counts.create_app.fetch_add(1, Ordering::SeqCst);
        self.inner.create_app(app).await
    }

    async fn update_app(&self, app: &App) -> Result<App> {
        self.counts.update_app.fetch_add(1, Ordering::SeqCst);
        self.inner.update_app(app).await
    }

    async fn delete_app(&self, app_id: &str) -> Result<()> {
        self.counts.delete_app.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_app(app_id).await
    }

    async fn list_recovery_points(&self, sync_pair: &SyncPair) -> Result<Vec<RecoveryPoint>> {
        self.counts.list_recovery_points.fetch_add(1, Ordering::SeqCst);
        self.inner.list_recovery_points(sync_pair).await
    }

    fn poll_interval(&self) -> Duration {
        self.inner.poll_interval()
    }
}

/// Fresh provider, client and counters for one test
pub struct TestHarness {
    pub provider: Provider,
    pub store: MemoryClient,
    pub counts: Arc<CallCounts>,
    pub meta: ProviderMeta,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_poll_interval(Duration::from_millis(5))
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        let store = MemoryClient::new(ACCOUNT_ID).with_poll_interval(poll_interval);
        let client = CountingClient::new(store.clone());
        let counts = client.counts();

        Self {
            provider: Provider::new(),
            store,
            counts,
            meta: ProviderMeta::new(Arc::new(client)),
        }
    }

    /// Normalize a resource configuration against its schema
    pub fn resource_data(&self, resource_type: &str, config: AttrMap) -> ResourceData {
        let schema = self
            .provider
            .resource(resource_type)
            .expect("resource type registered")
            .schema();
        let attrs = schema
            .normalize_with(config, |_| None)
            .expect("configuration is valid");
        ResourceData::new(attrs)
    }

    /// Normalize a data source configuration against its schema
    pub fn data_source_data(&self, data_source_type: &str, config: AttrMap) -> ResourceData {
        let schema = self
            .provider
            .data_source(data_source_type)
            .expect("data source type registered")
            .schema();
        let attrs = schema
            .normalize_with(config, |_| None)
            .expect("configuration is valid");
        ResourceData::new(attrs)
    }

    /// Store an app in the account, bypassing the counters
    pub async fn seed_app(&self, name: &str) -> String {
        let mut app = App::new(ACCOUNT_ID);
        app.name = name.to_string();
        app.rpo = 7200;
        app.source_aws_account_id = SOURCE_ACCOUNT.to_string();
        app.source_region = SOURCE_REGION.to_string();
        app.target_aws_account_id = TARGET_ACCOUNT.to_string();
        app.target_region = TARGET_REGION.to_string();
        self.store.insert_app(app).await
    }

    /// Store a recovery point for the test sync pair
    pub async fn seed_recovery_point(&self, id: &str, timestamp: &str) {
        self.store.add_recovery_point(recovery_point(id, timestamp)).await;
    }

    pub fn calls(&self) -> usize {
        self.counts.total()
    }
}

pub fn recovery_point(id: &str, timestamp: &str) -> RecoveryPoint {
    RecoveryPoint {
        recovery_point_id: id.to_string(),
        timestamp: timestamp
            .parse::<DateTime<Utc>>()
            .expect("valid test timestamp"),
        source_aws_account_id: SOURCE_ACCOUNT.to_string(),
        source_region: SOURCE_REGION.to_string(),
        target_aws_account_id: TARGET_ACCOUNT.to_string(),
        target_region: TARGET_REGION.to_string(),
    }
}

/// Build an attribute map from pairs
pub fn attrs(pairs: &[(&str, AttrValue)]) -> AttrMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A valid `arpio_app` configuration
pub fn app_config(name: &str) -> AttrMap {
    attrs(&[
        ("name", AttrValue::from(name)),
        ("rpo", AttrValue::Int(60)),
        ("primary_account_id", AttrValue::from(SOURCE_ACCOUNT)),
        ("primary_region", AttrValue::from(SOURCE_REGION)),
        ("recovery_account_id", AttrValue::from(TARGET_ACCOUNT)),
        ("recovery_region", AttrValue::from(TARGET_REGION)),
    ])
}

/// A `resources` block as configuration writes it (a one-element list)
pub fn resources_config(arns: &[&str], tags: &[(&str, &str)]) -> AttrValue {
    let mut block = AttrMap::new();
    if !arns.is_empty() {
        block.insert(
            "arns".to_string(),
            AttrValue::List(arns.iter().map(|a| AttrValue::from(*a)).collect()),
        );
    }
    if !tags.is_empty() {
        block.insert(
            "tags".to_string(),
            AttrValue::Map(
                tags.iter()
                    .map(|(k, v)| (k.to_string(), AttrValue::from(*v)))
                    .collect(),
            ),
        );
    }
    AttrValue::List(vec![AttrValue::Map(block)])
}

/// An `arpio_recovery_point` configuration
pub fn recovery_point_config(app_id: &str, timestamp_min: &str, timestamp: &str) -> AttrMap {
    attrs(&[
        ("app_id", AttrValue::from(app_id)),
        ("timestamp_min", AttrValue::from(timestamp_min)),
        ("timestamp", AttrValue::from(timestamp)),
    ])
}
