//! Configuration types for the Arpio provider
//!
//! Provider settings come from the provider block, with environment variables
//! as fallback. Acceptance tests read their AWS locations from the environment
//! as well.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::resource_data::ResourceData;

/// URL of the Arpio API
pub const ARPIO_API_URL_ENV: &str = "ARPIO_API_URL";
/// ID of the Arpio API key
pub const ARPIO_API_KEY_ID_ENV: &str = "ARPIO_API_KEY_ID";
/// Secret of the Arpio API key
pub const ARPIO_API_KEY_SECRET_ENV: &str = "ARPIO_API_KEY_SECRET";
/// Arpio account that protects and recovers resources
pub const ARPIO_ACCOUNT_ID_ENV: &str = "ARPIO_ACCOUNT_ID";
/// Seconds to sleep during configure so a debugger can attach
pub const ARPIO_DEBUG_WAIT_ENV: &str = "ARPIO_DEBUG_WAIT";

pub const ARPIO_TEST_SOURCE_AWS_ACCOUNT_ID_ENV: &str = "ARPIO_TEST_SOURCE_AWS_ACCOUNT_ID";
pub const ARPIO_TEST_SOURCE_REGION_ENV: &str = "ARPIO_TEST_SOURCE_REGION";
pub const ARPIO_TEST_TARGET_AWS_ACCOUNT_ID_ENV: &str = "ARPIO_TEST_TARGET_AWS_ACCOUNT_ID";
pub const ARPIO_TEST_TARGET_REGION_ENV: &str = "ARPIO_TEST_TARGET_REGION";

/// Default Arpio API endpoint
pub const DEFAULT_API_URL: &str = "https://api.arpio.io/api";

/// Arpio provider configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// URL of the Arpio API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key ID
    #[serde(default)]
    pub api_key_id: String,

    /// API key secret
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub api_key_secret: String,

    /// Arpio account ID
    pub account_id: String,
}

// Custom Debug implementation that hides the API key secret
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("api_key_id", &self.api_key_id)
            .field("api_key_secret", &"<REDACTED>")
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a configuration for an account against the default endpoint
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            api_url: default_api_url(),
            api_key_id: String::new(),
            api_key_secret: String::new(),
            account_id: account_id.into(),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.api_key_id = id.into();
        self.api_key_secret = secret.into();
        self
    }

    /// Set the API URL
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Load configuration through a variable lookup function
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Self {
            api_url: lookup(ARPIO_API_URL_ENV)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_api_url),
            api_key_id: lookup(ARPIO_API_KEY_ID_ENV).unwrap_or_default(),
            api_key_secret: lookup(ARPIO_API_KEY_SECRET_ENV).unwrap_or_default(),
            account_id: lookup(ARPIO_ACCOUNT_ID_ENV).unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from normalized provider attributes
    pub fn from_resource_data(d: &ResourceData) -> Result<Self> {
        let mut api_url = d.get_string("api_url")?;
        if api_url.is_empty() {
            api_url = default_api_url();
        }

        let config = Self {
            api_url,
            api_key_id: d.get_string("api_key_id")?,
            api_key_secret: d.get_string("api_key_secret")?,
            account_id: d.get_string("account_id")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.account_id.is_empty() {
            return Err(Error::config(format!(
                "account_id is required; set it in the provider block or via {}",
                ARPIO_ACCOUNT_ID_ENV
            )));
        }

        if !self.api_url.starts_with("https://") && !self.api_url.starts_with("http://") {
            return Err(Error::config(format!(
                "api_url must use HTTP or HTTPS scheme. Got: {}",
                self.api_url
            )));
        }

        if self.api_key_id.is_empty() != self.api_key_secret.is_empty() {
            return Err(Error::config(
                "api_key_id and api_key_secret must be set together",
            ));
        }

        Ok(())
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Read the debugger wait from `ARPIO_DEBUG_WAIT` via a lookup function
pub fn debug_wait_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Duration>> {
    let Some(raw) = lookup(ARPIO_DEBUG_WAIT_ENV) else {
        return Ok(None);
    };

    raw.trim()
        .parse::<u64>()
        .map(|secs| Some(Duration::from_secs(secs)))
        .map_err(|_| {
            Error::config(format!(
                "Environment variable {} is set to an invalid wait duration {:?}; \
                 specify an integer number of seconds",
                ARPIO_DEBUG_WAIT_ENV, raw
            ))
        })
}

/// Sleep for the configured debugger wait, if any
pub async fn wait_for_debugger_attach(lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(wait) = debug_wait_from_lookup(lookup)? {
        tracing::info!("Sleeping {} seconds for debugger to attach...", wait.as_secs());
        tokio::time::sleep(wait).await;
        tracing::info!("Continuing after debugger sleep");
    }
    Ok(())
}

/// Settings for tests that run against a live Arpio API
#[derive(Debug, Clone)]
pub struct AcceptanceTestConfig {
    pub provider: ProviderConfig,
    pub source_aws_account_id: String,
    pub source_region: String,
    pub target_aws_account_id: String,
    pub target_region: String,
}

impl AcceptanceTestConfig {
    /// Every variable an acceptance test needs
    pub const REQUIRED_VARS: [&'static str; 8] = [
        ARPIO_API_URL_ENV,
        ARPIO_API_KEY_ID_ENV,
        ARPIO_API_KEY_SECRET_ENV,
        ARPIO_ACCOUNT_ID_ENV,
        ARPIO_TEST_SOURCE_AWS_ACCOUNT_ID_ENV,
        ARPIO_TEST_SOURCE_REGION_ENV,
        ARPIO_TEST_TARGET_AWS_ACCOUNT_ID_ENV,
        ARPIO_TEST_TARGET_REGION_ENV,
    ];

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through a lookup function; every variable must be non-empty
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::config(format!("{} must be set for acceptance tests", key)))
        };

        for key in Self::REQUIRED_VARS {
            require(key)?;
        }

        Ok(Self {
            provider: ProviderConfig::from_lookup(&lookup)?,
            source_aws_account_id: require(ARPIO_TEST_SOURCE_AWS_ACCOUNT_ID_ENV)?,
            source_region: require(ARPIO_TEST_SOURCE_REGION_ENV)?,
            target_aws_account_id: require(ARPIO_TEST_TARGET_AWS_ACCOUNT_ID_ENV)?,
            target_region: require(ARPIO_TEST_TARGET_REGION_ENV)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults_url() {
        let config = ProviderConfig::from_lookup(lookup_from(&[(ARPIO_ACCOUNT_ID_ENV, "acct")]))
            .unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.account_id, "acct");
    }

    #[test]
    fn test_missing_account_rejected() {
        let err = ProviderConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("account_id is required"));
    }

    #[test]
    fn test_half_api_key_rejected() {
        let config = ProviderConfig::new("acct").with_api_key("id", "");
        assert!(config.validate().is_err());
        assert!(ProviderConfig::new("acct").with_api_key("id", "secret").validate().is_ok());
    }

    #[test]
    fn test_bad_url_rejected() {
        let config = ProviderConfig::new("acct").with_api_url("ftp://arpio");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_not_exposed_in_debug() {
        let config = ProviderConfig::new("acct").with_api_key("key-id", "super-secret-value");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("super-secret-value"));
        assert!(debug_str.contains("key-id"));
    }

    #[test]
    fn test_debug_wait() {
        assert_eq!(debug_wait_from_lookup(lookup_from(&[])).unwrap(), None);
        assert_eq!(
            debug_wait_from_lookup(lookup_from(&[(ARPIO_DEBUG_WAIT_ENV, "3")])).unwrap(),
            Some(Duration::from_secs(3))
        );
        let err = debug_wait_from_lookup(lookup_from(&[(ARPIO_DEBUG_WAIT_ENV, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("invalid wait duration"));
    }

    #[test]
    fn test_acceptance_config_requires_every_var() {
        let err = AcceptanceTestConfig::from_lookup(lookup_from(&[(ARPIO_ACCOUNT_ID_ENV, "acct")]))
            .unwrap_err();
        assert!(err.to_string().contains("must be set for acceptance tests"));

        let config = AcceptanceTestConfig::from_lookup(lookup_from(&[
            (ARPIO_API_URL_ENV, "https://api.example.com"),
            (ARPIO_API_KEY_ID_ENV, "id"),
            (ARPIO_API_KEY_SECRET_ENV, "secret"),
            (ARPIO_ACCOUNT_ID_ENV, "acct"),
            (ARPIO_TEST_SOURCE_AWS_ACCOUNT_ID_ENV, "111"),
            (ARPIO_TEST_SOURCE_REGION_ENV, "us-east-1"),
            (ARPIO_TEST_TARGET_AWS_ACCOUNT_ID_ENV, "222"),
            (ARPIO_TEST_TARGET_REGION_ENV, "us-west-2"),
        ]))
        .unwrap();
        assert_eq!(config.provider.api_url, "https://api.example.com");
        assert_eq!(config.target_region, "us-west-2");
    }
}
