//! Asynchronous pfSense REST API v2 client.

use crate::models::{ApiResponse, BaseConfig, FirewallRuleRecord, FirewallRules, SystemHostname};
use crate::Result;
use async_trait::async_trait;
use pfsense_core::client::ClientConfig;
use pfsense_core::config::PfSenseConnectionConfig;
use pfsense_core::query::ListQuery;
use pfsense_core::{Authorization, Error};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("pfsense-api/", env!("CARGO_PKG_VERSION"));

const HOSTNAME_PATH: &str = "api/v2/system/hostname";
const FIREWALL_RULES_PATH: &str = "api/v2/firewall/rules";

/// Read operations the provider needs from an appliance.
#[async_trait]
pub trait PfSenseApi: Send + Sync {
    /// Fetch hostname and domain.
    async fn get_base_config(&self) -> Result<BaseConfig>;

    /// Fetch every firewall rule, in rule order.
    async fn get_firewall_rules(&self) -> Result<FirewallRules>;
}

/// Builder for [`PfSenseClient`].
#[derive(Debug)]
pub struct PfSenseClientBuilder {
    config: PfSenseConnectionConfig,
    http_config: ClientConfig,
    authorization: Option<Authorization>,
}

impl PfSenseClientBuilder {
    /// Create a builder from a connection configuration.
    #[must_use]
    pub fn new(config: PfSenseConnectionConfig) -> Self {
        Self {
            config,
            http_config: ClientConfig::new(),
            authorization: None,
        }
    }

    /// Set the authentication strategy.
    #[must_use]
    pub fn with_authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = Some(authorization);
        self
    }

    /// Configure HTTP basic authentication credentials.
    #[must_use]
    pub fn with_basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_authorization(Authorization::basic(username, password))
    }

    /// Configure an `X-API-Key` header.
    #[must_use]
    pub fn with_api_key(self, token: impl Into<String>) -> Self {
        self.with_authorization(Authorization::api_key(token))
    }

    /// Override the HTTP client configuration.
    ///
    /// The request timeout is still taken from the connection configuration.
    #[must_use]
    pub fn with_http_config(mut self, http_config: ClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the configuration is invalid, no
    /// authentication strategy was set, or the HTTP client cannot be built.
    pub fn build(self) -> Result<PfSenseClient> {
        self.config.check()?;
        let base_url = self.config.parse_url()?;

        let authorization = self.authorization.ok_or_else(|| {
            Error::ConfigError("no authentication method configured".to_string())
        })?;

        let http_config = self.http_config.with_timeout(self.config.timeout());

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = http_config.apply(
            ClientBuilder::new()
                .user_agent(USER_AGENT)
                .default_headers(headers),
        );

        if self.config.insecure {
            warn!(url = %base_url, "TLS verification disabled for pfSense client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build pfSense HTTP client: {err}"))
        })?;

        debug!(url = %base_url, auth = authorization.kind(), "pfSense client ready");

        Ok(PfSenseClient {
            http,
            base_url,
            authorization: Arc::new(authorization),
            log_requests: http_config.enable_logging,
        })
    }
}

/// Asynchronous client for a single pfSense appliance.
#[derive(Clone)]
pub struct PfSenseClient {
    http: Client,
    base_url: Url,
    authorization: Arc<Authorization>,
    log_requests: bool,
}

impl PfSenseClient {
    /// Start a builder for the given connection configuration.
    #[must_use]
    pub fn builder(config: PfSenseConnectionConfig) -> PfSenseClientBuilder {
        PfSenseClientBuilder::new(config)
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch hostname and domain from `GET /api/v2/system/hostname`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedResponse`] when the response carries no
    /// hostname data, otherwise the transport or status error.
    pub async fn get_base_config(&self) -> Result<BaseConfig> {
        let response = self.get_json::<SystemHostname>(HOSTNAME_PATH, &[]).await?;
        let data = response.data.ok_or_else(|| {
            Error::UnexpectedResponse(format!(
                "no data retrieving base config (response_id: {})",
                response.response_id.as_deref().unwrap_or("none")
            ))
        })?;
        BaseConfig::try_from(data)
    }

    /// Fetch every firewall rule from `GET /api/v2/firewall/rules?limit=0`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedResponse`] when the response carries no
    /// rule list, otherwise the transport or status error.
    pub async fn get_firewall_rules(&self) -> Result<FirewallRules> {
        self.list_firewall_rules(&ListQuery::all()).await
    }

    /// Fetch firewall rules with explicit paging.
    ///
    /// # Errors
    ///
    /// Same as [`PfSenseClient::get_firewall_rules`].
    pub async fn list_firewall_rules(&self, query: &ListQuery) -> Result<FirewallRules> {
        let response = self
            .get_json::<Vec<FirewallRuleRecord>>(FIREWALL_RULES_PATH, &query.to_pairs())
            .await?;
        let records = response.data.ok_or_else(|| {
            Error::UnexpectedResponse(format!(
                "no data retrieving firewall rules (response_id: {})",
                response.response_id.as_deref().unwrap_or("none")
            ))
        })?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid pfSense path `{path}`: {err}")))
    }

    async fn get_json<T>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.build_url(path)?;
        let request = self.authorization.apply(self.http.get(url).query(params));

        if self.log_requests {
            info!(path, ?params, auth = self.authorization.kind(), "pfSense request");
        }

        let response = request.send().await.map_err(Error::from)?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let error = Error::from_status(status, &body);
            debug!(path, %status, code = error.error_code(), "pfSense request failed");
            return Err(error);
        }

        response.json::<ApiResponse<T>>().await.map_err(|err| {
            Error::ParseError(format!(
                "Failed to parse pfSense response for `{path}`: {err}"
            ))
        })
    }
}

#[async_trait]
impl PfSenseApi for PfSenseClient {
    async fn get_base_config(&self) -> Result<BaseConfig> {
        PfSenseClient::get_base_config(self).await
    }

    async fn get_firewall_rules(&self) -> Result<FirewallRules> {
        PfSenseClient::get_firewall_rules(self).await
    }
}
