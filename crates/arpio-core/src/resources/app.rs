//! `arpio_app` resource
//!
//! ## Create
//!
//! Create adopts an existing app instead of failing when one with the same
//! name already exists:
//!
//! 1. Build the desired app from configuration
//! 2. List the account's apps and count exact name matches
//! 3. No match: create the app and record its id
//! 4. One match: record its id and run an update against it
//! 5. More matches: fail without touching anything
//!
//! Two applies racing on the same name can both see no match and create
//! duplicates. The API gives no way to prevent that here.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::App;
use crate::provider::ProviderMeta;
use crate::resource_data::ResourceData;
use crate::rules::{RESOURCES_KEY, flatten_selection_rules, selection_rules_from_attr};
use crate::schema::{Field, FieldKind, Schema};
use crate::traits::Resource;
use crate::validate::validate_arn;

pub const APP_RESOURCE_TYPE: &str = "arpio_app";

/// The `arpio_app` resource
#[derive(Debug, Clone, Copy, Default)]
pub struct AppResource;

impl AppResource {
    pub fn new() -> Self {
        Self
    }
}

/// Schema of the `arpio_app` resource
pub fn app_schema() -> Schema {
    let resources = Schema::new()
        .field(
            "arns",
            Field::set(FieldKind::String)
                .optional()
                .description("ARNs of stateful resources that Arpio should protect")
                .validate_with(validate_arn),
        )
        .field(
            "tags",
            Field::map(FieldKind::String)
                .optional()
                .description("Tags matching stateful resources that Arpio should protect"),
        );

    Schema::new()
        .field("name", Field::string().required())
        .field(
            "rpo",
            Field::int()
                .required()
                .description("Recovery point objective, in minutes"),
        )
        .field("primary_account_id", Field::string().required())
        .field("primary_region", Field::string().required())
        .field("recovery_account_id", Field::string().required())
        .field("recovery_region", Field::string().required())
        .field(
            "notification_emails",
            Field::list(FieldKind::String)
                .optional()
                .description("Email address of Arpio users who wish to receive notification emails"),
        )
        .field(
            RESOURCES_KEY,
            Field::block(resources, 1)
                .optional()
                .description("Specifies rules for matching resources to protect"),
        )
}

/// Overlay the configured fields onto `app`
pub fn set_app_from_resource_data(d: &ResourceData, app: &mut App) -> Result<()> {
    let mut emails = d.get_string_list("notification_emails")?;
    emails.sort();

    app.name = d.get_string("name")?;
    let rpo = d.get_int("rpo")?;
    app.rpo = rpo
        .checked_mul(60)
        .ok_or_else(|| Error::invalid_input(format!("rpo {} minutes is out of range", rpo)))?;
    app.source_aws_account_id = d.get_string("primary_account_id")?;
    app.source_region = d.get_string("primary_region")?;
    app.target_aws_account_id = d.get_string("recovery_account_id")?;
    app.target_region = d.get_string("recovery_region")?;
    app.notification_emails = emails;
    app.selection_rules = selection_rules_from_attr(d.get(RESOURCES_KEY))?;
    Ok(())
}

/// Record `app` in the resource attributes
pub fn set_resource_data_from_app(d: &mut ResourceData, app: &App) -> Result<()> {
    let sync_pair = app.sync_pair();
    let resources = flatten_selection_rules(&app.selection_rules, d.get(RESOURCES_KEY))?;

    d.set("name", &app.name);
    d.set("rpo", app.rpo / 60);
    d.set("primary_account_id", sync_pair.source.account_id);
    d.set("primary_region", sync_pair.source.region);
    d.set("recovery_account_id", sync_pair.target.account_id);
    d.set("recovery_region", sync_pair.target.region);
    d.set("notification_emails", app.notification_emails.clone());
    if !resources.is_null() {
        d.set(RESOURCES_KEY, resources);
    }
    Ok(())
}

#[async_trait]
impl Resource for AppResource {
    fn type_name(&self) -> &'static str {
        APP_RESOURCE_TYPE
    }

    fn schema(&self) -> Schema {
        app_schema()
    }

    async fn create(&self, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let client = meta.client();

        let mut app = client.new_app();
        set_app_from_resource_data(d, &mut app)?;

        let apps = client.list_apps().await?;
        debug!("Found {} existing apps in account {}", apps.len(), client.account_id());

        let mut existing_id: Option<&str> = None;
        for existing in apps.iter().filter(|a| a.name == app.name) {
            if existing_id.is_some() {
                return Err(Error::duplicate_app(&app.name));
            }
            existing_id = Some(existing.app_id.as_str());
        }

        match existing_id {
            Some(app_id) => {
                info!("Adopting existing app {} ({})", app.name, app_id);
                d.set_id(app_id);
                self.update(d, meta).await
            }
            None => {
                let created = client.create_app(&app).await?;
                info!("Created app {} ({})", app.name, created.app_id);
                d.set_id(&created.app_id);
                set_resource_data_from_app(d, &app)
            }
        }
    }

    async fn read(&self, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let app = meta.client().get_app(d.id()).await?;

        match app {
            Some(app) if !app.app_id.is_empty() => set_resource_data_from_app(d, &app),
            _ => {
                warn!("App {} no longer exists; removing it from state", d.id());
                d.clear_id();
                Ok(())
            }
        }
    }

    async fn update(&self, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let client = meta.client();

        let mut app = client
            .get_app(d.id())
            .await?
            .ok_or_else(|| Error::not_found(format!("app {} does not exist", d.id())))?;
        set_app_from_resource_data(d, &mut app)?;

        let updated = client.update_app(&app).await?;
        info!("Updated app {} ({})", updated.name, updated.app_id);
        set_resource_data_from_app(d, &updated)
    }

    async fn delete(&self, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        meta.client().delete_app(d.id()).await?;
        info!("Deleted app {}", d.id());
        d.clear_id();
        Ok(())
    }
}
