//! `arpio_recovery_point` data source
//!
//! Finds the latest recovery point of an app inside an optional time window,
//! waiting up to `timeout` for one to appear. The lookup runs again only when
//! `app_id`, `timestamp` or `timestamp_min` change, so a later read does not
//! poll the API for a result it already has.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::provider::ProviderMeta;
use crate::resource_data::ResourceData;
use crate::schema::{Field, Schema};
use crate::traits::DataSource;
use crate::validate::{parse_duration, parse_rfc3339_timestamp};

pub const RECOVERY_POINT_DATA_SOURCE_TYPE: &str = "arpio_recovery_point";

/// Attributes whose change triggers a new lookup
const LOOKUP_KEYS: [&str; 3] = ["app_id", "timestamp", "timestamp_min"];

/// The `arpio_recovery_point` data source
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryPointDataSource;

impl RecoveryPointDataSource {
    pub fn new() -> Self {
        Self
    }
}

/// Schema of the `arpio_recovery_point` data source
pub fn recovery_point_schema() -> Schema {
    Schema::new()
        .field(
            "app_id",
            Field::string()
                .required()
                .description("ID of the Arpio application resource the recovery point was created for"),
        )
        .field(
            "timestamp",
            Field::string().optional().description(
                "Point in time to find the nearest existing recovery point (RFC 3339 format)",
            ),
        )
        .field(
            "timestamp_min",
            Field::string().optional().description(
                "Select only recovery points created on or after this point in time (RFC 3339 format)",
            ),
        )
        .field(
            "timeout",
            Field::string()
                .optional()
                .default("0s")
                .description("Duration to wait for a matching recovery point to exist"),
        )
        .field("primary_account_id", Field::string().computed())
        .field("primary_region", Field::string().computed())
        .field("recovery_account_id", Field::string().computed())
        .field("recovery_region", Field::string().computed())
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    if raw.is_empty() {
        return Ok(Duration::ZERO);
    }
    parse_duration(raw)
        .map_err(|_| Error::invalid_input(format!("error parsing timeout: invalid duration {:?}", raw)))
}

#[async_trait]
impl DataSource for RecoveryPointDataSource {
    fn type_name(&self) -> &'static str {
        RECOVERY_POINT_DATA_SOURCE_TYPE
    }

    fn schema(&self) -> Schema {
        recovery_point_schema()
    }

    async fn read(&self, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        if !LOOKUP_KEYS.iter().any(|key| d.has_change(key)) {
            debug!("Recovery point lookup inputs unchanged; keeping {}", d.id());
            return Ok(());
        }

        let timeout = parse_timeout(&d.get_string("timeout")?)?;
        let timestamp_min = parse_rfc3339_timestamp(&d.get_string("timestamp_min")?)?;
        let timestamp_max = parse_rfc3339_timestamp(&d.get_string("timestamp")?)?;

        let app_id = d.get_string("app_id")?;
        let client = meta.client();
        let app = client
            .get_app(&app_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("app {} does not exist", app_id)))?;

        let sync_pair = app.sync_pair();
        debug!(
            "Looking up recovery point for app {} ({}) with timeout {:?}",
            app_id, sync_pair, timeout
        );

        let rp = client
            .must_find_latest_recovery_point(&sync_pair, timestamp_min, timestamp_max, timeout)
            .await?;
        info!(
            "Found recovery point {} at timestamp {}",
            rp.recovery_point_id,
            rp.timestamp.to_rfc3339()
        );

        d.set("primary_account_id", sync_pair.source.account_id);
        d.set("primary_region", sync_pair.source.region);
        d.set("recovery_account_id", sync_pair.target.account_id);
        d.set("recovery_region", sync_pair.target.region);
        d.set_id(rp.recovery_point_id);
        Ok(())
    }
}
