//! Error types for the Arpio provider
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the Arpio provider
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (malformed ARN, timestamp, duration, missing field)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An attribute value did not have the variant its caller requires
    #[error("Attribute type error: {0}")]
    AttributeType(String),

    /// More than one remote app carries the requested name
    #[error(
        "more than one Arpio app already exists with the name {name:?}; use the Arpio web \
         interface to rename the unrelated apps, then retry the creation"
    )]
    DuplicateApp {
        /// The contested app name
        name: String,
    },

    /// Remote object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Non-success answer from the Arpio API
    #[error("Arpio API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an attribute type error
    pub fn attribute_type(msg: impl Into<String>) -> Self {
        Self::AttributeType(msg.into())
    }

    /// Create a duplicate app name error
    pub fn duplicate_app(name: impl Into<String>) -> Self {
        Self::DuplicateApp { name: name.into() }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether this error was produced locally before any remote call
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::AttributeType(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
