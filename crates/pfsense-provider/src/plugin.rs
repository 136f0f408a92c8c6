//! Traits implemented by everything a provider registers.
//!
//! Configuration, plans and state travel as JSON objects matching the
//! component's [`Schema`]; problems are reported through [`Diagnostics`].

use crate::diagnostics::Diagnostics;
use crate::schema::Schema;
use async_trait::async_trait;
use pfsense_api::PfSenseApi;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Data handed from a configured provider to its components.
#[derive(Clone)]
pub struct ProviderData {
    client: Arc<dyn PfSenseApi>,
}

impl ProviderData {
    /// Wrap an API client.
    #[must_use]
    pub fn new(client: Arc<dyn PfSenseApi>) -> Self {
        Self { client }
    }

    /// The API client.
    #[must_use]
    pub fn client(&self) -> Arc<dyn PfSenseApi> {
        Arc::clone(&self.client)
    }
}

impl fmt::Debug for ProviderData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderData").finish_non_exhaustive()
    }
}

/// A read-only data source.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Suffix appended to the provider type name, e.g. `configs`.
    fn type_name_suffix(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// Receive provider data. `None` means the provider is not configured yet.
    fn configure(&mut self, _provider_data: Option<&ProviderData>, _diags: &mut Diagnostics) {}

    /// Read the data source, returning its state.
    async fn read(&self, config: &Value, diags: &mut Diagnostics) -> Option<Value>;
}

/// A managed resource.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Suffix appended to the provider type name.
    fn type_name_suffix(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// Receive provider data.
    fn configure(&mut self, _provider_data: Option<&ProviderData>, _diags: &mut Diagnostics) {}

    /// Create from a plan, returning the new state.
    async fn create(&self, plan: &Value, diags: &mut Diagnostics) -> Option<Value>;

    /// Refresh existing state.
    async fn read(&self, state: &Value, diags: &mut Diagnostics) -> Option<Value>;

    /// Apply a plan to existing state, returning the new state.
    async fn update(&self, plan: &Value, diags: &mut Diagnostics) -> Option<Value>;

    /// Delete the resource.
    async fn delete(&self, state: &Value, diags: &mut Diagnostics);
}

/// A resource that only lives for the duration of one run.
#[async_trait]
pub trait EphemeralResource: Send + Sync {
    /// Suffix appended to the provider type name.
    fn type_name_suffix(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// Open the resource, returning its result object.
    async fn open(&self, config: &Value, diags: &mut Diagnostics) -> Option<Value>;
}

/// A provider-defined function.
pub trait Function: Send + Sync {
    /// Function name.
    fn name(&self) -> &'static str;

    /// One-line summary.
    fn summary(&self) -> &'static str;

    /// Parameter names in call order.
    fn parameters(&self) -> &'static [&'static str];

    /// Call the function.
    fn call(&self, arguments: &[Value], diags: &mut Diagnostics) -> Option<Value>;
}

/// Creates a data source.
pub type DataSourceFactory = fn() -> Box<dyn DataSource>;
/// Creates a resource.
pub type ResourceFactory = fn() -> Box<dyn Resource>;
/// Creates an ephemeral resource.
pub type EphemeralResourceFactory = fn() -> Box<dyn EphemeralResource>;
/// Creates a function.
pub type FunctionFactory = fn() -> Box<dyn Function>;
