//! String validators attached to schema attributes.

use crate::diagnostics::{AttributePath, Diagnostics};
use std::fmt;

/// Validates a string attribute value.
pub trait StringValidator: fmt::Debug + Send + Sync {
    /// Plain text description used in documentation.
    fn description(&self) -> String;

    /// Markdown description used in documentation.
    fn markdown_description(&self) -> String {
        self.description()
    }

    /// Validate `value` found at `path`, recording any problem.
    fn validate(&self, path: &AttributePath, value: &str, diags: &mut Diagnostics);
}

/// Accepts only one of a fixed set of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneOf {
    values: Vec<String>,
}

impl OneOf {
    /// Validator accepting exactly the given values.
    #[must_use]
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    fn quoted(&self) -> String {
        let quoted: Vec<String> = self.values.iter().map(|v| format!("{v:?}")).collect();
        format!("[{}]", quoted.join(","))
    }
}

impl StringValidator for OneOf {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.quoted())
    }

    fn validate(&self, path: &AttributePath, value: &str, diags: &mut Diagnostics) {
        if self.values.iter().any(|allowed| allowed == value) {
            return;
        }
        diags.add_attribute_error(
            path.clone(),
            "Invalid Attribute Value Match",
            format!(
                "Attribute {path} value must be one of: {}, got: {value:?}",
                self.quoted()
            ),
        );
    }
}

/// Accepts `null` (any port), a port number, or a `low:high` port range.
///
/// Only range endpoints are checked against `1..=65535`; a single value just
/// has to be an integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortRangeOrNull;

const PORT_DESCRIPTION: &str = "Set to `null` to allow any port.<br>Other valid options are: a TCP/UDP port number, a TCP/UDP port range separated by `:`.";

impl PortRangeOrNull {
    /// Parse a port number in `1..=65535`.
    ///
    /// # Errors
    ///
    /// Returns a message when the value is not a number in range.
    pub fn port_number(value: &str) -> Result<u16, String> {
        match value.parse::<u16>() {
            Ok(port) if port >= 1 => Ok(port),
            _ => Err("value must be `null` or a number between 1 and 65535".to_string()),
        }
    }

    fn is_digits(value: &str) -> bool {
        !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
    }
}

impl StringValidator for PortRangeOrNull {
    fn description(&self) -> String {
        PORT_DESCRIPTION.to_string()
    }

    fn validate(&self, path: &AttributePath, value: &str, diags: &mut Diagnostics) {
        if value == "null" {
            return;
        }

        if let Some((low, high)) = value.split_once(':') {
            if Self::is_digits(low) && Self::is_digits(high) {
                for endpoint in [low, high] {
                    if Self::port_number(endpoint).is_err() {
                        diags.add_attribute_error(
                            path.clone(),
                            format!("Invalid port number in range: {endpoint}"),
                            "Value must be a number between 1 and 65535.",
                        );
                        return;
                    }
                }
                return;
            }
        }

        if let Err(err) = value.parse::<i64>() {
            diags.add_attribute_error(path.clone(), "Invalid port value", format!("{value:?}: {err}"));
        }
    }
}
