//! Resource and data source traits
//!
//! A resource owns a remote object through create/read/update/delete; a
//! data source only reads. Both receive the host's [`ResourceData`] and the
//! configured [`ProviderMeta`].

use async_trait::async_trait;

use crate::error::Result;
use crate::provider::ProviderMeta;
use crate::resource_data::ResourceData;
use crate::schema::Schema;

/// A managed resource type (e.g. `arpio_app`)
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name used by configurations
    fn type_name(&self) -> &'static str;

    /// Attribute schema
    fn schema(&self) -> Schema;

    /// Create the remote object and set the id
    async fn create(&self, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()>;

    /// Refresh state from the remote object; clears the id if it is gone
    async fn read(&self, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()>;

    /// Push configuration changes to the remote object
    async fn update(&self, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()>;

    /// Delete the remote object
    async fn delete(&self, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()>;
}

/// A read-only data source type (e.g. `arpio_recovery_point`)
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Type name used by configurations
    fn type_name(&self) -> &'static str;

    /// Attribute schema
    fn schema(&self) -> Schema;

    /// Resolve the data source and record the result in `d`
    async fn read(&self, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()>;
}
