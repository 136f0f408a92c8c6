//! The `pfsense-v2` provider.

use crate::config::{Environment, ProviderModel};
use crate::data_source::ConfigsDataSource;
use crate::diagnostics::Diagnostics;
use crate::plugin::{
    DataSource, DataSourceFactory, EphemeralResource, EphemeralResourceFactory, Function,
    FunctionFactory, ProviderData, Resource, ResourceFactory,
};
use crate::schema::{Attribute, Schema};
use crate::stubs::{EchoFunction, ExampleDataSource, ExampleEphemeralResource, ExampleResource};
use pfsense_api::PfSenseClient;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Provider type name, also the prefix of every component type name.
pub const TYPE_NAME: &str = "pfsense-v2";

/// Name and version reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    /// Provider type name
    pub type_name: &'static str,
    /// Provider version
    pub version: String,
}

/// Signature of a provider function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSignature {
    /// One-line summary
    pub summary: &'static str,
    /// Parameter names in call order
    pub parameters: &'static [&'static str],
}

/// Every schema the provider exposes, keyed by full type name.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchemas {
    /// Provider configuration schema
    pub provider: Schema,
    /// Data source schemas
    pub data_sources: BTreeMap<String, Schema>,
    /// Resource schemas
    pub resources: BTreeMap<String, Schema>,
    /// Ephemeral resource schemas
    pub ephemeral_resources: BTreeMap<String, Schema>,
    /// Function signatures
    pub functions: BTreeMap<String, FunctionSignature>,
}

/// Reads pfSense configuration over the REST API v2.
#[derive(Debug)]
pub struct PfSenseProvider {
    version: String,
    data: Option<ProviderData>,
}

/// Full type name of a component.
#[must_use]
pub fn type_name(suffix: &str) -> String {
    format!("{TYPE_NAME}_{suffix}")
}

impl PfSenseProvider {
    /// Unconfigured provider reporting `version`.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            data: None,
        }
    }

    /// Provider with data already in place, skipping [`configure`](Self::configure).
    #[must_use]
    pub fn with_provider_data(mut self, data: ProviderData) -> Self {
        self.data = Some(data);
        self
    }

    /// Name and version.
    #[must_use]
    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: TYPE_NAME,
            version: self.version.clone(),
        }
    }

    /// Whether [`configure`](Self::configure) succeeded.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.data.is_some()
    }

    /// Provider configuration schema.
    #[must_use]
    pub fn schema() -> Schema {
        Schema::new(
            "Interact with a pfSense appliance through its REST API v2.",
            [
                (
                    "url",
                    Attribute::string(
                        "URL of the pfSense appliance. May also be set with `PFSENSEV2_URL`.",
                    )
                    .optional(),
                ),
                (
                    "insecure",
                    Attribute::bool(
                        "Skip TLS certificate verification. May also be set with `PFSENSEV2_INSECURE`.",
                    )
                    .optional(),
                ),
                (
                    "username",
                    Attribute::string(
                        "User name for basic authentication. May also be set with `PFSENSEV2_API_USERNAME`.",
                    )
                    .optional(),
                ),
                (
                    "password",
                    Attribute::string(
                        "Password for basic authentication. May also be set with `PFSENSEV2_API_PASSWORD`.",
                    )
                    .optional()
                    .sensitive(),
                ),
                (
                    "api_token",
                    Attribute::string(
                        "API key sent as `X-API-Key`. May also be set with `PFSENSEV2_API_TOKEN`.",
                    )
                    .optional()
                    .sensitive(),
                ),
            ],
        )
    }

    /// Resolve the configuration and build the API client.
    ///
    /// On any error diagnostic the provider stays unconfigured.
    pub fn configure(&mut self, config: &ProviderModel, env: &dyn Environment, diags: &mut Diagnostics) {
        let Some(resolved) = config.resolve(env, diags) else {
            return;
        };

        let url = resolved.connection.url.clone();
        match PfSenseClient::builder(resolved.connection)
            .with_authorization(resolved.authorization)
            .build()
        {
            Ok(client) => {
                info!(url = %url, "configured pfSense client");
                self.data = Some(ProviderData::new(Arc::new(client)));
            }
            Err(err) => diags.add_error(
                "Unable to Create PFSenseV2 API Client",
                format!(
                    "An unexpected error occurred when creating the PFSenseV2 API client. \
                     PFSenseV2 Client Error: {err}"
                ),
            ),
        }
    }

    /// Registered data sources.
    #[must_use]
    pub fn data_sources() -> Vec<DataSourceFactory> {
        vec![ConfigsDataSource::boxed, ExampleDataSource::boxed]
    }

    /// Registered resources.
    #[must_use]
    pub fn resources() -> Vec<ResourceFactory> {
        vec![ExampleResource::boxed]
    }

    /// Registered ephemeral resources.
    #[must_use]
    pub fn ephemeral_resources() -> Vec<EphemeralResourceFactory> {
        vec![ExampleEphemeralResource::boxed]
    }

    /// Registered functions.
    #[must_use]
    pub fn functions() -> Vec<FunctionFactory> {
        vec![EchoFunction::boxed]
    }

    /// Instantiate and configure the data source named `name`.
    pub fn data_source(&self, name: &str, diags: &mut Diagnostics) -> Option<Box<dyn DataSource>> {
        let Some(mut data_source) = Self::data_sources()
            .into_iter()
            .map(|factory| factory())
            .find(|ds| type_name(ds.type_name_suffix()) == name)
        else {
            unknown_type(diags, "data source", name);
            return None;
        };

        debug!(data_source = name, configured = self.is_configured(), "configuring data source");
        data_source.configure(self.data.as_ref(), diags);
        Some(data_source)
    }

    /// Instantiate and configure the resource named `name`.
    pub fn resource(&self, name: &str, diags: &mut Diagnostics) -> Option<Box<dyn Resource>> {
        let Some(mut resource) = Self::resources()
            .into_iter()
            .map(|factory| factory())
            .find(|r| type_name(r.type_name_suffix()) == name)
        else {
            unknown_type(diags, "resource", name);
            return None;
        };

        resource.configure(self.data.as_ref(), diags);
        Some(resource)
    }

    /// Instantiate the ephemeral resource named `name`.
    pub fn ephemeral_resource(
        &self,
        name: &str,
        diags: &mut Diagnostics,
    ) -> Option<Box<dyn EphemeralResource>> {
        let found = Self::ephemeral_resources()
            .into_iter()
            .map(|factory| factory())
            .find(|r| type_name(r.type_name_suffix()) == name);
        if found.is_none() {
            unknown_type(diags, "ephemeral resource", name);
        }
        found
    }

    /// Look up a function by its bare name, e.g. `echo`.
    pub fn function(&self, name: &str, diags: &mut Diagnostics) -> Option<Box<dyn Function>> {
        let found = Self::functions()
            .into_iter()
            .map(|factory| factory())
            .find(|f| f.name() == name);
        if found.is_none() {
            unknown_type(diags, "function", name);
        }
        found
    }

    /// Every schema the provider exposes.
    #[must_use]
    pub fn schemas() -> ProviderSchemas {
        ProviderSchemas {
            provider: Self::schema(),
            data_sources: Self::data_sources()
                .into_iter()
                .map(|factory| factory())
                .map(|ds| (type_name(ds.type_name_suffix()), ds.schema()))
                .collect(),
            resources: Self::resources()
                .into_iter()
                .map(|factory| factory())
                .map(|r| (type_name(r.type_name_suffix()), r.schema()))
                .collect(),
            ephemeral_resources: Self::ephemeral_resources()
                .into_iter()
                .map(|factory| factory())
                .map(|r| (type_name(r.type_name_suffix()), r.schema()))
                .collect(),
            functions: Self::functions()
                .into_iter()
                .map(|factory| factory())
                .map(|f| {
                    (
                        f.name().to_string(),
                        FunctionSignature {
                            summary: f.summary(),
                            parameters: f.parameters(),
                        },
                    )
                })
                .collect(),
        }
    }
}

fn unknown_type(diags: &mut Diagnostics, kind: &str, name: &str) {
    diags.add_error(
        format!("Unknown {kind}"),
        format!("The provider {TYPE_NAME} does not support the {kind} {name:?}."),
    );
}
