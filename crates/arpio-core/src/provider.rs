//! Provider registry and configuration
//!
//! The [`Provider`] maps type names to resource and data source
//! implementations, declares the provider block schema and turns a configured
//! provider block into a [`ProviderMeta`] shared by every operation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arpio_core::provider::Provider;
//!
//! let mut provider = Provider::new();
//! arpio_client_http::register(&mut provider);
//!
//! let meta = provider.configure(&provider_data).await?;
//! provider.resource("arpio_app")?.create(&mut d, &meta).await?;
//! ```
//!
//! ## Registration
//!
//! Client crates register a factory during initialization:
//!
//! ```rust,ignore
//! pub fn register(provider: &mut Provider) {
//!     provider.register_client_factory(Arc::new(HttpClientFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{
    ARPIO_ACCOUNT_ID_ENV, ARPIO_API_KEY_ID_ENV, ARPIO_API_KEY_SECRET_ENV, ARPIO_API_URL_ENV,
    DEFAULT_API_URL, ProviderConfig, wait_for_debugger_attach,
};
use crate::data_sources::RecoveryPointDataSource;
use crate::error::{Error, Result};
use crate::resource_data::ResourceData;
use crate::resources::AppResource;
use crate::schema::{Field, Schema};
use crate::traits::{ArpioClient, ArpioClientFactory, DataSource, Resource};

/// State shared by all operations of a configured provider
#[derive(Clone)]
pub struct ProviderMeta {
    client: Arc<dyn ArpioClient>,
}

impl ProviderMeta {
    pub fn new(client: Arc<dyn ArpioClient>) -> Self {
        Self { client }
    }

    /// The configured Arpio client
    pub fn client(&self) -> &dyn ArpioClient {
        self.client.as_ref()
    }
}

impl std::fmt::Debug for ProviderMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderMeta")
            .field("account_id", &self.client.account_id())
            .finish()
    }
}

/// Schema of the provider block
pub fn provider_schema() -> Schema {
    Schema::new()
        .field(
            "api_url",
            Field::string()
                .optional()
                .env_default(ARPIO_API_URL_ENV, Some(DEFAULT_API_URL))
                .description("URL of the Arpio API"),
        )
        .field(
            "api_key_id",
            Field::string()
                .optional()
                .sensitive()
                .env_default(ARPIO_API_KEY_ID_ENV, None)
                .description("ID of the Arpio API key"),
        )
        .field(
            "api_key_secret",
            Field::string()
                .optional()
                .sensitive()
                .env_default(ARPIO_API_KEY_SECRET_ENV, None)
                .description("Secret of the Arpio API key"),
        )
        .field(
            "account_id",
            Field::string()
                .required()
                .env_default(ARPIO_ACCOUNT_ID_ENV, None)
                .description("ID of the Arpio account that protects and recovers resources"),
        )
}

/// Registry of resource types, data source types and the client factory
#[derive(Default)]
pub struct Provider {
    resources: HashMap<String, Arc<dyn Resource>>,
    data_sources: HashMap<String, Arc<dyn DataSource>>,
    client_factory: Option<Arc<dyn ArpioClientFactory>>,
}

impl Provider {
    /// Create a provider with the built-in resource and data source types
    ///
    /// No client factory is registered; see [`Provider::register_client_factory`].
    pub fn new() -> Self {
        let mut provider = Self::default();
        provider.register_resource(Arc::new(AppResource::new()));
        provider.register_data_source(Arc::new(RecoveryPointDataSource::new()));
        provider
    }

    /// Register a resource type under its type name
    pub fn register_resource(&mut self, resource: Arc<dyn Resource>) {
        self.resources
            .insert(resource.type_name().to_string(), resource);
    }

    /// Register a data source type under its type name
    pub fn register_data_source(&mut self, data_source: Arc<dyn DataSource>) {
        self.data_sources
            .insert(data_source.type_name().to_string(), data_source);
    }

    /// Register the factory used by [`Provider::configure`]; replaces any previous one
    pub fn register_client_factory(&mut self, factory: Arc<dyn ArpioClientFactory>) {
        self.client_factory = Some(factory);
    }

    /// Look up a resource type
    pub fn resource(&self, name: &str) -> Result<Arc<dyn Resource>> {
        self.resources
            .get(name)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown resource type: {}", name)))
    }

    /// Look up a data source type
    pub fn data_source(&self, name: &str) -> Result<Arc<dyn DataSource>> {
        self.data_sources
            .get(name)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown data source type: {}", name)))
    }

    /// Registered resource type names, sorted
    pub fn list_resources(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered data source type names, sorted
    pub fn list_data_sources(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data_sources.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_resource(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn has_data_source(&self, name: &str) -> bool {
        self.data_sources.contains_key(name)
    }

    /// Schema of the provider block
    pub fn schema(&self) -> Schema {
        provider_schema()
    }

    /// Check the provider schema and every registered schema
    pub fn internal_validate(&self) -> Result<()> {
        self.schema()
            .internal_validate()
            .map_err(|e| Error::config(format!("provider: {}", e)))?;

        for (name, resource) in &self.resources {
            resource
                .schema()
                .internal_validate()
                .map_err(|e| Error::config(format!("resource {}: {}", name, e)))?;
        }
        for (name, data_source) in &self.data_sources {
            data_source
                .schema()
                .internal_validate()
                .map_err(|e| Error::config(format!("data source {}: {}", name, e)))?;
        }
        Ok(())
    }

    /// Build the client for a normalized provider block
    ///
    /// Honors `ARPIO_DEBUG_WAIT` before the client is created.
    pub async fn configure(&self, d: &ResourceData) -> Result<ProviderMeta> {
        self.configure_with(d, |key| std::env::var(key).ok()).await
    }

    /// [`Provider::configure`] with an explicit environment lookup
    pub async fn configure_with(
        &self,
        d: &ResourceData,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ProviderMeta> {
        let config = ProviderConfig::from_resource_data(d)?;
        wait_for_debugger_attach(lookup).await?;

        let factory = self
            .client_factory
            .as_ref()
            .ok_or_else(|| Error::config("No Arpio client factory registered"))?;

        tracing::debug!("Configuring Arpio client: {:?}", config);
        let client = factory.create(&config)?;
        Ok(ProviderMeta::new(client))
    }
}
