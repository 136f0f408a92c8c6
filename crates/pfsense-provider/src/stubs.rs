//! Example components registered next to the real data source.
//!
//! None of these talk to the appliance; they pass planned values through
//! and fill in fixed identifiers.

use crate::diagnostics::Diagnostics;
use crate::plugin::{DataSource, EphemeralResource, Function, Resource};
use crate::schema::{Attribute, Schema};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::trace;

/// Identifier assigned by the example data source and resource.
pub const EXAMPLE_ID: &str = "example-id";
/// Value opened by the example ephemeral resource.
pub const EXAMPLE_TOKEN: &str = "token-123";

fn object(value: &Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn with_id(value: &Value) -> Value {
    let mut object = object(value);
    object.insert("id".to_string(), Value::String(EXAMPLE_ID.to_string()));
    Value::Object(object)
}

/// Example data source.
#[derive(Debug, Default)]
pub struct ExampleDataSource;

impl ExampleDataSource {
    /// Boxed instance for registration.
    #[must_use]
    pub fn boxed() -> Box<dyn DataSource> {
        Box::new(Self)
    }
}

#[async_trait]
impl DataSource for ExampleDataSource {
    fn type_name_suffix(&self) -> &'static str {
        "example"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Example data source",
            [
                (
                    "configurable_attribute",
                    Attribute::string("Example configurable attribute").optional(),
                ),
                ("id", Attribute::string("Example identifier").computed()),
            ],
        )
    }

    async fn read(&self, config: &Value, diags: &mut Diagnostics) -> Option<Value> {
        self.schema().validate_config(config, diags);
        if diags.has_error() {
            return None;
        }
        trace!("read a data source");
        Some(with_id(config))
    }
}

/// Example resource.
#[derive(Debug, Default)]
pub struct ExampleResource;

impl ExampleResource {
    /// Boxed instance for registration.
    #[must_use]
    pub fn boxed() -> Box<dyn Resource> {
        Box::new(Self)
    }
}

#[async_trait]
impl Resource for ExampleResource {
    fn type_name_suffix(&self) -> &'static str {
        "example"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Example resource",
            [
                (
                    "configurable_attribute",
                    Attribute::string("Example configurable attribute").optional(),
                ),
                ("id", Attribute::string("Example identifier").computed()),
            ],
        )
    }

    async fn create(&self, plan: &Value, diags: &mut Diagnostics) -> Option<Value> {
        self.schema().validate_config(plan, diags);
        if diags.has_error() {
            return None;
        }
        trace!("created a resource");
        Some(with_id(plan))
    }

    async fn read(&self, state: &Value, _diags: &mut Diagnostics) -> Option<Value> {
        Some(state.clone())
    }

    async fn update(&self, plan: &Value, diags: &mut Diagnostics) -> Option<Value> {
        self.schema().validate_config(plan, diags);
        if diags.has_error() {
            return None;
        }
        Some(with_id(plan))
    }

    async fn delete(&self, _state: &Value, _diags: &mut Diagnostics) {}
}

/// Example ephemeral resource.
#[derive(Debug, Default)]
pub struct ExampleEphemeralResource;

impl ExampleEphemeralResource {
    /// Boxed instance for registration.
    #[must_use]
    pub fn boxed() -> Box<dyn EphemeralResource> {
        Box::new(Self)
    }
}

#[async_trait]
impl EphemeralResource for ExampleEphemeralResource {
    fn type_name_suffix(&self) -> &'static str {
        "example"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Example ephemeral resource",
            [
                (
                    "configurable_attribute",
                    Attribute::string("Example configurable attribute").required(),
                ),
                ("value", Attribute::string("Example value").computed().sensitive()),
            ],
        )
    }

    async fn open(&self, config: &Value, diags: &mut Diagnostics) -> Option<Value> {
        self.schema().validate_config(config, diags);
        if diags.has_error() {
            return None;
        }
        let mut result = object(config);
        result.insert("value".to_string(), Value::String(EXAMPLE_TOKEN.to_string()));
        trace!("opened an ephemeral resource");
        Some(Value::Object(result))
    }
}

/// Returns its single string argument.
#[derive(Debug, Default)]
pub struct EchoFunction;

impl EchoFunction {
    /// Boxed instance for registration.
    #[must_use]
    pub fn boxed() -> Box<dyn Function> {
        Box::new(Self)
    }
}

impl Function for EchoFunction {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn summary(&self) -> &'static str {
        "Echo a string"
    }

    fn parameters(&self) -> &'static [&'static str] {
        &["input"]
    }

    fn call(&self, arguments: &[Value], diags: &mut Diagnostics) -> Option<Value> {
        match arguments {
            [Value::String(input)] => Some(Value::String(input.clone())),
            [other] => {
                diags.add_error(
                    "Invalid Function Argument",
                    format!("Argument \"input\" must be a string, got {other}"),
                );
                None
            }
            _ => {
                diags.add_error(
                    "Invalid Function Argument",
                    format!("Function \"echo\" takes 1 argument, got {}", arguments.len()),
                );
                None
            }
        }
    }
}
