//! Attribute schemas and configuration validation.

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::validators::StringValidator;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Schema of a provider, data source, resource or ephemeral resource.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    /// Markdown description
    pub description: String,
    /// Attributes by name
    pub attributes: BTreeMap<String, Attribute>,
}

/// Value type of an attribute.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "nested", rename_all = "snake_case")]
pub enum AttributeKind {
    /// String
    String,
    /// Boolean
    Bool,
    /// List of strings
    StringList,
    /// List of objects with their own attributes
    NestedList(BTreeMap<String, Attribute>),
}

impl AttributeKind {
    const fn expected(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::StringList => "list of string",
            Self::NestedList(_) => "list of object",
        }
    }
}

/// A single schema attribute.
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    /// Value type
    #[serde(flatten)]
    pub kind: AttributeKind,
    /// Markdown description
    pub description: String,
    /// Must be set in configuration
    pub required: bool,
    /// May be set in configuration
    pub optional: bool,
    /// Set by the provider
    pub computed: bool,
    /// Hidden from output
    pub sensitive: bool,
    /// Validators run on string values
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_validators"
    )]
    pub validators: Vec<Arc<dyn StringValidator>>,
}

fn serialize_validators<S>(
    validators: &[Arc<dyn StringValidator>],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(validators.iter().map(|v| v.markdown_description()))
}

impl Attribute {
    fn new(kind: AttributeKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            validators: Vec::new(),
        }
    }

    /// String attribute.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self::new(AttributeKind::String, description)
    }

    /// Boolean attribute.
    #[must_use]
    pub fn bool(description: impl Into<String>) -> Self {
        Self::new(AttributeKind::Bool, description)
    }

    /// List of strings.
    #[must_use]
    pub fn string_list(description: impl Into<String>) -> Self {
        Self::new(AttributeKind::StringList, description)
    }

    /// List of nested objects.
    #[must_use]
    pub fn nested_list<I, K>(description: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        let attributes = attributes
            .into_iter()
            .map(|(name, attribute)| (name.into(), attribute))
            .collect();
        Self::new(AttributeKind::NestedList(attributes), description)
    }

    /// Mark as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark as computed.
    #[must_use]
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Mark as sensitive.
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Attach a string validator.
    #[must_use]
    pub fn with_validator(mut self, validator: impl StringValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    const fn configurable(&self) -> bool {
        self.required || self.optional
    }
}

impl Schema {
    /// Schema with the given description and attributes.
    #[must_use]
    pub fn new<I, K>(description: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        Self {
            description: description.into(),
            attributes: attributes
                .into_iter()
                .map(|(name, attribute)| (name.into(), attribute))
                .collect(),
        }
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Check a configuration object against the schema.
    ///
    /// Reports unsupported and missing attributes, type mismatches and
    /// values set on computed-only attributes, and runs string validators
    /// on every present string value.
    pub fn validate_config(&self, config: &Value, diags: &mut Diagnostics) {
        match config {
            Value::Null => validate_object(&self.attributes, &Map::new(), None, diags),
            Value::Object(object) => validate_object(&self.attributes, object, None, diags),
            other => diags.add_error(
                "Invalid configuration",
                format!("Configuration must be an object, got {}", json_type(other)),
            ),
        }
    }
}

fn validate_object(
    attributes: &BTreeMap<String, Attribute>,
    object: &Map<String, Value>,
    parent: Option<&AttributePath>,
    diags: &mut Diagnostics,
) {
    let child = |name: &str| match parent {
        Some(parent) => parent.attribute(name),
        None => AttributePath::root(name),
    };

    for name in object.keys() {
        if !attributes.contains_key(name) {
            diags.add_attribute_error(
                child(name),
                "Unsupported argument",
                format!("An argument named {name:?} is not expected here."),
            );
        }
    }

    for (name, attribute) in attributes {
        let path = child(name);
        let value = object.get(name).unwrap_or(&Value::Null);

        if value.is_null() {
            if attribute.required {
                diags.add_attribute_error(
                    path,
                    "Missing required argument",
                    format!("The argument {name:?} is required, but no definition was found."),
                );
            }
            continue;
        }

        if !attribute.configurable() {
            diags.add_attribute_error(
                path,
                "Invalid Configuration for Read-Only Attribute",
                format!("Cannot set value for attribute {name:?} as it is computed by the provider."),
            );
            continue;
        }

        validate_value(attribute, value, &path, diags);
    }
}

fn validate_value(attribute: &Attribute, value: &Value, path: &AttributePath, diags: &mut Diagnostics) {
    match (&attribute.kind, value) {
        (AttributeKind::String, Value::String(text)) => {
            for validator in &attribute.validators {
                validator.validate(path, text, diags);
            }
        }
        (AttributeKind::Bool, Value::Bool(_)) => {}
        (AttributeKind::StringList, Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                match item {
                    Value::String(text) => {
                        for validator in &attribute.validators {
                            validator.validate(&path.index(index), text, diags);
                        }
                    }
                    other => type_mismatch(&path.index(index), "string", other, diags),
                }
            }
        }
        (AttributeKind::NestedList(nested), Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                let element = path.index(index);
                match item {
                    Value::Object(object) => validate_object(nested, object, Some(&element), diags),
                    other => type_mismatch(&element, "object", other, diags),
                }
            }
        }
        (kind, other) => type_mismatch(path, kind.expected(), other, diags),
    }
}

fn type_mismatch(path: &AttributePath, expected: &str, found: &Value, diags: &mut Diagnostics) {
    diags.add_attribute_error(
        path.clone(),
        "Incorrect attribute value type",
        format!("Inappropriate value for attribute {path}: {expected} required, got {}.", json_type(found)),
    );
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{OneOf, PortRangeOrNull};
    use serde_json::json;

    fn sample_schema() -> Schema {
        Schema::new(
            "sample",
            [
                ("id", Attribute::string("Identifier").computed()),
                ("name", Attribute::string("Name").required()),
                ("enabled", Attribute::bool("Enabled").optional()),
                ("tags", Attribute::string_list("Tags").optional()),
                (
                    "rules",
                    Attribute::nested_list(
                        "Rules",
                        [
                            (
                                "type",
                                Attribute::string("Type")
                                    .required()
                                    .with_validator(OneOf::new(["pass", "block"])),
                            ),
                            (
                                "port",
                                Attribute::string("Port")
                                    .optional()
                                    .with_validator(PortRangeOrNull),
                            ),
                        ],
                    )
                    .optional()
                    .computed(),
                ),
            ],
        )
    }

    fn validate(config: Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        sample_schema().validate_config(&config, &mut diags);
        diags
    }

    fn summaries(diags: &Diagnostics) -> Vec<(String, String)> {
        diags
            .iter()
            .map(|d| {
                (
                    d.attribute.as_ref().map(ToString::to_string).unwrap_or_default(),
                    d.summary.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn valid_config_has_no_diagnostics() {
        let diags = validate(json!({
            "name": "edge",
            "enabled": true,
            "tags": ["a", "b"],
            "rules": [{"type": "pass", "port": "443"}, {"type": "block"}]
        }));
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn missing_required_attribute() {
        let diags = validate(json!({}));
        assert_eq!(
            summaries(&diags),
            vec![("name".to_string(), "Missing required argument".to_string())]
        );
    }

    #[test]
    fn null_config_is_treated_as_empty_object() {
        let diags = validate(Value::Null);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn unsupported_and_computed_attributes() {
        let diags = validate(json!({"name": "edge", "id": "x", "bogus": 1}));
        assert_eq!(
            summaries(&diags),
            vec![
                ("bogus".to_string(), "Unsupported argument".to_string()),
                (
                    "id".to_string(),
                    "Invalid Configuration for Read-Only Attribute".to_string()
                ),
            ]
        );
    }

    #[test]
    fn nested_validators_run_with_paths() {
        let diags = validate(json!({
            "name": "edge",
            "rules": [{"type": "pass"}, {"type": "allow", "port": "0:10"}]
        }));
        assert_eq!(
            summaries(&diags),
            vec![
                (
                    "rules[1].port".to_string(),
                    "Invalid port number in range: 0".to_string()
                ),
                (
                    "rules[1].type".to_string(),
                    "Invalid Attribute Value Match".to_string()
                ),
            ]
        );
    }

    #[test]
    fn type_mismatches() {
        let diags = validate(json!({
            "name": 5,
            "enabled": "yes",
            "tags": ["ok", 1],
            "rules": ["not an object"]
        }));
        let paths: Vec<String> = summaries(&diags).into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["enabled", "name", "rules[0]", "tags[1]"]);
        assert!(diags
            .iter()
            .all(|d| d.summary == "Incorrect attribute value type"));
    }

    #[test]
    fn non_object_config() {
        let diags = validate(json!([1, 2]));
        assert!(diags.has_error());
        assert!(diags.iter().next().unwrap().attribute.is_none());
    }

    #[test]
    fn schema_serializes_validator_descriptions() {
        let json = serde_json::to_value(sample_schema()).unwrap();
        assert_eq!(json["attributes"]["name"]["type"], "string");
        assert_eq!(json["attributes"]["name"]["required"], true);
        assert!(json["attributes"]["name"].get("validators").is_none());

        let nested = &json["attributes"]["rules"]["nested"];
        assert_eq!(
            nested["type"]["validators"][0],
            r#"value must be one of: ["pass","block"]"#
        );
    }
}
