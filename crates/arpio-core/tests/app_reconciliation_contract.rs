//! Contract Test: App Reconciliation
//!
//! Verifies the `arpio_app` lifecycle against an in-memory account.
//!
//! Constraints verified:
//! - Create adopts a single app with the same name instead of duplicating it
//! - Create refuses to pick between several apps with the same name
//! - Validation failures never reach the API
//! - Read treats a vanished app as "gone", not as an error
//! - Notification emails are always stored sorted

mod common;

use arpio_core::attr::{AttrMap, AttrValue};
use arpio_core::traits::ArpioClient;
use arpio_core::{Error, ResourceData};
use common::*;
use std::sync::atomic::Ordering;
use tokio_test::{assert_err, assert_ok};

const ARN_A: &str = "arn:aws:s3:us-east-1:111111111111:bucket/a";
const ARN_B: &str = "arn:aws:rds:us-east-1:111111111111:db:b";

#[tokio::test]
async fn create_without_match_creates_new_app() {
    let h = TestHarness::new();
    let app = h.provider.resource("arpio_app").unwrap();
    let mut d = h.resource_data("arpio_app", app_config("site"));

    assert_ok!(app.create(&mut d, &h.meta).await);

    assert!(!d.id().is_empty());
    assert_eq!(h.counts.list_apps.load(Ordering::SeqCst), 1);
    assert_eq!(h.counts.create_app.load(Ordering::SeqCst), 1);
    assert_eq!(h.counts.update_app.load(Ordering::SeqCst), 0);

    let stored = h.store.get_app(d.id()).await.unwrap().unwrap();
    assert_eq!(stored.name, "site");
    assert_eq!(stored.rpo, 3600);
    assert_eq!(stored.account_id, ACCOUNT_ID);
    assert_eq!(d.get_int("rpo").unwrap(), 60);
    assert_eq!(d.get_string("recovery_region").unwrap(), TARGET_REGION);
}

#[tokio::test]
async fn create_with_single_match_adopts_existing_app() {
    let h = TestHarness::new();
    let existing_id = h.seed_app("site").await;
    h.seed_app("other").await;

    let app = h.provider.resource("arpio_app").unwrap();
    let mut d = h.resource_data("arpio_app", app_config("site"));

    assert_ok!(app.create(&mut d, &h.meta).await);

    assert_eq!(d.id(), existing_id);
    assert_eq!(h.counts.create_app.load(Ordering::SeqCst), 0);
    assert_eq!(h.counts.update_app.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.app_count().await, 2);

    let stored = h.store.get_app(&existing_id).await.unwrap().unwrap();
    assert_eq!(stored.rpo, 3600, "adopted app takes the configured RPO");
    assert_eq!(d.get_int("rpo").unwrap(), 60);
}

#[tokio::test]
async fn create_with_duplicate_names_fails_without_mutation() {
    let h = TestHarness::new();
    h.seed_app("site").await;
    h.seed_app("site").await;

    let app = h.provider.resource("arpio_app").unwrap();
    let mut d = h.resource_data("arpio_app", app_config("site"));

    let err = assert_err!(app.create(&mut d, &h.meta).await);

    assert!(matches!(err, Error::DuplicateApp { .. }));
    assert!(err.to_string().contains("more than one Arpio app already exists"));
    assert_eq!(d.id(), "");
    assert_eq!(h.counts.mutations(), 0);
    assert_eq!(h.store.app_count().await, 2);
}

#[tokio::test]
async fn name_match_is_case_sensitive() {
    let h = TestHarness::new();
    h.seed_app("Site").await;

    let app = h.provider.resource("arpio_app").unwrap();
    let mut d = h.resource_data("arpio_app", app_config("site"));

    assert_ok!(app.create(&mut d, &h.meta).await);
    assert_eq!(h.counts.create_app.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.app_count().await, 2);
}

#[tokio::test]
async fn invalid_arn_fails_before_any_remote_call() {
    let h = TestHarness::new();
    let app = h.provider.resource("arpio_app").unwrap();

    let mut block = AttrMap::new();
    block.insert("arns".to_string(), AttrValue::string_set([ARN_A, "i-0123456789"]));
    let mut config = app_config("site");
    config.insert("resources".to_string(), AttrValue::block(block));
    let mut d = ResourceData::new(config);

    let err = assert_err!(app.create(&mut d, &h.meta).await);

    assert!(err.is_validation());
    assert!(err.to_string().contains("i-0123456789"));
    assert_eq!(h.calls(), 0);
    assert_eq!(d.id(), "");
}

#[test]
fn invalid_arn_is_rejected_by_schema() {
    let h = TestHarness::new();
    let schema = h.provider.resource("arpio_app").unwrap().schema();

    let mut config = app_config("site");
    config.insert("resources".to_string(), resources_config(&["not-an-arn"], &[]));

    let err = assert_err!(schema.normalize_with(config, |_| None));
    assert!(err.to_string().contains("(not-an-arn) is an invalid ARN"));
}

#[tokio::test]
async fn notification_emails_are_stored_sorted() {
    let h = TestHarness::new();
    let app = h.provider.resource("arpio_app").unwrap();

    let mut config = app_config("site");
    config.insert(
        "notification_emails".to_string(),
        AttrValue::from(vec![
            "zoe@example.com".to_string(),
            "adam@example.com".to_string(),
            "mia@example.com".to_string(),
        ]),
    );
    let mut d = h.resource_data("arpio_app", config);

    assert_ok!(app.create(&mut d, &h.meta).await);

    let expected = vec!["adam@example.com", "mia@example.com", "zoe@example.com"];
    let stored = h.store.get_app(d.id()).await.unwrap().unwrap();
    assert_eq!(stored.notification_emails, expected);
    assert_eq!(d.get_string_list("notification_emails").unwrap(), expected);
}

#[tokio::test]
async fn selection_rules_survive_create_and_read() {
    let h = TestHarness::new();
    let app = h.provider.resource("arpio_app").unwrap();

    let mut config = app_config("site");
    config.insert(
        "resources".to_string(),
        resources_config(&[ARN_B, ARN_A], &[("env", "prod"), ("team", "dr")]),
    );
    let mut d = h.resource_data("arpio_app", config);
    let configured = d.get("resources").clone();

    assert_ok!(app.create(&mut d, &h.meta).await);

    let stored = h.store.get_app(d.id()).await.unwrap().unwrap();
    assert_eq!(stored.selection_rules.len(), 3, "one ARN rule and two tag rules");

    assert_ok!(app.read(&mut d, &h.meta).await);
    assert_eq!(d.get("resources"), &configured);
}

#[tokio::test]
async fn declared_block_exposes_remote_rules() {
    let h = TestHarness::new();
    let id = h.seed_app("site").await;
    let mut remote = h.store.get_app(&id).await.unwrap().unwrap();
    remote.selection_rules = vec![arpio_core::SelectionRule::tag_rule("env", "prod")];
    h.store.insert_app(remote).await;

    let app = h.provider.resource("arpio_app").unwrap();
    let mut d = ResourceData::with_id(
        id,
        attrs(&[("resources", resources_config(&[], &[]))]),
    );

    assert_ok!(app.read(&mut d, &h.meta).await);

    let AttrValue::Block(Some(block)) = d.get("resources") else {
        panic!("expected a resources block, got {:?}", d.get("resources"));
    };
    assert_eq!(block["tags"], AttrValue::Map(attrs(&[("env", AttrValue::from("prod"))])));
    assert_eq!(d.get_int("rpo").unwrap(), 120);
}

#[tokio::test]
async fn undeclared_block_stays_absent_after_read() {
    let h = TestHarness::new();
    let id = h.seed_app("site").await;
    let mut remote = h.store.get_app(&id).await.unwrap().unwrap();
    remote.selection_rules = vec![arpio_core::SelectionRule::tag_rule("env", "prod")];
    h.store.insert_app(remote).await;

    let app = h.provider.resource("arpio_app").unwrap();
    let mut d = ResourceData::with_id(id, AttrMap::new());

    assert_ok!(app.read(&mut d, &h.meta).await);

    assert!(d.get("resources").is_null());
    assert_eq!(d.get_int("rpo").unwrap(), 120);
}

#[tokio::test]
async fn read_of_vanished_app_clears_id() {
    let h = TestHarness::new();
    let app = h.provider.resource("arpio_app").unwrap();
    let mut d = h.resource_data("arpio_app", app_config("site"));
    assert_ok!(app.create(&mut d, &h.meta).await);

    h.store.clear().await;

    assert_ok!(app.read(&mut d, &h.meta).await);
    assert_eq!(d.id(), "");
}

#[tokio::test]
async fn update_overlays_configuration() {
    let h = TestHarness::new();
    let app = h.provider.resource("arpio_app").unwrap();
    let mut d = h.resource_data("arpio_app", app_config("site"));
    assert_ok!(app.create(&mut d, &h.meta).await);
    let id = d.id().to_string();

    let mut config = app_config("site-renamed");
    config.insert("rpo".to_string(), AttrValue::Int(15));
    let attrs = h.resource_data("arpio_app", config).into_attributes();
    let mut d = ResourceData::with_id(id.clone(), attrs);

    assert_ok!(app.update(&mut d, &h.meta).await);

    let stored = h.store.get_app(&id).await.unwrap().unwrap();
    assert_eq!(stored.name, "site-renamed");
    assert_eq!(stored.rpo, 900);
    assert_eq!(d.id(), id);
}

#[tokio::test]
async fn update_of_missing_app_is_an_error() {
    let h = TestHarness::new();
    let app = h.provider.resource("arpio_app").unwrap();
    let attrs = h.resource_data("arpio_app", app_config("site")).into_attributes();
    let mut d = ResourceData::with_id("app-404", attrs);

    let err = assert_err!(app.update(&mut d, &h.meta).await);
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(h.counts.update_app.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn delete_propagates_remote_errors() {
    let h = TestHarness::new();
    let app = h.provider.resource("arpio_app").unwrap();
    let mut d = ResourceData::with_id("app-404", AttrMap::new());

    let err = assert_err!(app.delete(&mut d, &h.meta).await);
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(d.id(), "app-404");
}
