//! Managed resource types

pub mod app;

pub use app::{APP_RESOURCE_TYPE, AppResource};
