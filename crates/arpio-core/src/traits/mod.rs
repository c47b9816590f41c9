//! Core traits for the Arpio provider
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ArpioClient`]: Talk to the Arpio API
//! - [`Resource`]: Managed resource lifecycle
//! - [`DataSource`]: Read-only lookups

pub mod client;
pub mod resource;

pub use client::{ArpioClient, ArpioClientFactory, DEFAULT_POLL_INTERVAL};
pub use resource::{DataSource, Resource};
