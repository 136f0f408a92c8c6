//! Connection configuration for a pfSense appliance.
//!
//! Holds the appliance URL, the TLS verification switch and the request
//! timeout. Credentials live in [`crate::auth`].

use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Configuration for reaching a single pfSense appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PfSenseConnectionConfig {
    /// Base URL of the appliance (e.g. `https://192.168.1.1`)
    #[validate(url)]
    pub url: String,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_request_timeout_secs() -> u64 {
    crate::client::PFSENSE_DEFAULT_TIMEOUT
}

impl PfSenseConnectionConfig {
    /// Create a new connection configuration.
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL of the appliance (e.g., "https://192.168.1.1")
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            url: url.into(),
            insecure: false,
            request_timeout_secs: default_request_timeout_secs(),
        };

        config.check()?;
        Ok(config)
    }

    /// Allow insecure TLS connections.
    #[must_use]
    pub const fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Run field validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the failing fields.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Parse the base URL.
    ///
    /// The returned URL always ends in `/` so relative API paths are joined
    /// beneath any path prefix the appliance is served under.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or is not http(s).
    pub fn parse_url(&self) -> Result<Url, Error> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| Error::ConfigError(format!("Invalid pfSense URL: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::ConfigError(format!(
                "Invalid pfSense URL: unsupported scheme `{}`",
                url.scheme()
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }
}
