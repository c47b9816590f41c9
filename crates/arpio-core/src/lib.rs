// # arpio-core
//
// Core library for the Arpio disaster-recovery provider.
//
// ## Architecture Overview
//
// The provider exposes the Arpio API as declarative resources:
// - **ArpioClient**: Trait for talking to the Arpio API (apps, recovery points)
// - **Resource / DataSource**: Traits for managed resources and read-only lookups
// - **AppResource**: `arpio_app`, with create-or-adopt by name
// - **RecoveryPointDataSource**: `arpio_recovery_point`, a bounded-wait lookup
// - **Provider**: Registry of resource types plus the client factory
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Resource logic is separate from the HTTP client
// 2. **Plugin-Based**: Client factories are registered, not hard-coded
// 3. **Library-First**: Every operation can be driven as a library call
// 4. **Typed Attributes**: Host values are a closed enum, not runtime type switches

pub mod attr;
pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod model;
pub mod provider;
pub mod resource_data;
pub mod resources;
pub mod rules;
pub mod schema;
pub mod traits;
pub mod validate;

// Re-export core types for convenience
pub use attr::{AttrMap, AttrValue};
pub use client::{MemoryClient, MemoryClientFactory};
pub use config::{AcceptanceTestConfig, ProviderConfig};
pub use data_sources::RecoveryPointDataSource;
pub use error::{Error, Result};
pub use model::{App, Location, RecoveryPoint, RecoveryPointQuery, SelectionRule, SyncPair};
pub use provider::{Provider, ProviderMeta};
pub use resource_data::ResourceData;
pub use resources::AppResource;
pub use schema::{Field, FieldKind, Schema};
pub use traits::{ArpioClient, ArpioClientFactory, DataSource, Resource};
