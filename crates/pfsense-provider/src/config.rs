//! Provider configuration and its environment variable fallback.
//!
//! Explicit configuration always wins over the environment. Every problem is
//! reported as a diagnostic before any network call is made.

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::value::ConfigValue;
use pfsense_core::config::PfSenseConnectionConfig;
use pfsense_core::Authorization;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Appliance URL.
pub const ENV_URL: &str = "PFSENSEV2_URL";
/// Skip TLS verification when set to anything but `0`, `false` or `no`.
pub const ENV_INSECURE: &str = "PFSENSEV2_INSECURE";
/// Basic auth user name.
pub const ENV_USERNAME: &str = "PFSENSEV2_API_USERNAME";
/// Basic auth password.
pub const ENV_PASSWORD: &str = "PFSENSEV2_API_PASSWORD";
/// API key.
pub const ENV_API_TOKEN: &str = "PFSENSEV2_API_TOKEN";

/// Source of environment variables.
pub trait Environment {
    /// Value of `key`, if set.
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Provider configuration as written by the user.
#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderModel {
    /// Appliance URL
    #[serde(default)]
    pub url: ConfigValue<String>,
    /// Skip TLS verification
    #[serde(default)]
    pub insecure: ConfigValue<bool>,
    /// Basic auth user name
    #[serde(default)]
    pub username: ConfigValue<String>,
    /// Basic auth password
    #[serde(default)]
    pub password: ConfigValue<String>,
    /// API key
    #[serde(default)]
    pub api_token: ConfigValue<String>,
}

impl fmt::Debug for ProviderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redacted(value: &ConfigValue<String>) -> &'static str {
            match value {
                ConfigValue::Null => "null",
                ConfigValue::Unknown => "unknown",
                ConfigValue::Known(_) => "[REDACTED]",
            }
        }

        f.debug_struct("ProviderModel")
            .field("url", &self.url)
            .field("insecure", &self.insecure)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("api_token", &redacted(&self.api_token))
            .finish()
    }
}

/// Configuration ready to build an API client.
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Where and how to connect
    pub connection: PfSenseConnectionConfig,
    /// How to authenticate
    pub authorization: Authorization,
}

struct Setting {
    attribute: &'static str,
    label: &'static str,
    env: &'static str,
}

const URL: Setting = Setting {
    attribute: "url",
    label: "URL",
    env: ENV_URL,
};
const INSECURE: Setting = Setting {
    attribute: "insecure",
    label: "Insecure Flag",
    env: ENV_INSECURE,
};
const USERNAME: Setting = Setting {
    attribute: "username",
    label: "API Client Username",
    env: ENV_USERNAME,
};
const PASSWORD: Setting = Setting {
    attribute: "password",
    label: "API Client Password",
    env: ENV_PASSWORD,
};
const API_TOKEN: Setting = Setting {
    attribute: "api_token",
    label: "API Client Token",
    env: ENV_API_TOKEN,
};

impl Setting {
    fn unknown(&self, diags: &mut Diagnostics) {
        diags.add_attribute_error(
            AttributePath::root(self.attribute),
            format!("Unknown PFSenseV2 {}", self.label),
            format!(
                "The provider cannot create the API client as there is an unknown {} value. \
                 Either target apply the source of the value first, set the value statically \
                 in the configuration, or use the {} environment variable.",
                self.label, self.env
            ),
        );
    }

    fn missing(&self, diags: &mut Diagnostics) {
        diags.add_attribute_error(
            AttributePath::root(self.attribute),
            format!("Missing PFSenseV2 {}", self.label),
            format!(
                "The provider cannot create the API client as there is no {} provided. \
                 Set the {} in the configuration or use the {} environment variable.",
                self.label, self.attribute, self.env
            ),
        );
    }

    fn resolve(&self, value: &ConfigValue<String>, env: &dyn Environment) -> Option<String> {
        match value {
            ConfigValue::Known(value) => Some(value.clone()),
            _ => env.var(self.env),
        }
        .filter(|value| !value.is_empty())
    }
}

fn env_flag(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && !matches!(
            value.to_ascii_lowercase().as_str(),
            "0" | "false" | "no"
        )
}

impl ProviderModel {
    /// Resolve the configuration against the environment.
    ///
    /// Returns `None` when any error diagnostic was recorded.
    pub fn resolve(&self, env: &dyn Environment, diags: &mut Diagnostics) -> Option<ResolvedConfig> {
        let string_settings = [
            (&URL, &self.url),
            (&USERNAME, &self.username),
            (&PASSWORD, &self.password),
            (&API_TOKEN, &self.api_token),
        ];

        for (setting, value) in &string_settings {
            if value.is_unknown() {
                setting.unknown(diags);
            }
        }
        if self.insecure.is_unknown() {
            INSECURE.unknown(diags);
        }
        if diags.has_error() {
            return None;
        }

        let url = URL.resolve(&self.url, env);
        let username = USERNAME.resolve(&self.username, env);
        let password = PASSWORD.resolve(&self.password, env);
        let token = API_TOKEN.resolve(&self.api_token, env);
        let insecure = match self.insecure {
            ConfigValue::Known(flag) => flag,
            _ => env.var(ENV_INSECURE).is_some_and(|value| env_flag(&value)),
        };

        let connection = match url {
            None => {
                URL.missing(diags);
                None
            }
            Some(url) => match PfSenseConnectionConfig::new(url.as_str())
                .and_then(|config| config.parse_url().map(|_| config))
            {
                Ok(config) => Some(config.with_insecure(insecure)),
                Err(err) => {
                    diags.add_attribute_error(
                        AttributePath::root(URL.attribute),
                        "Invalid PFSenseV2 URL",
                        format!("The URL {url:?} cannot be used: {err}"),
                    );
                    None
                }
            },
        };

        let authorization = match (username, password, token) {
            (username, password, Some(_)) if username.is_some() || password.is_some() => {
                diags.add_attribute_error(
                    AttributePath::root(API_TOKEN.attribute),
                    "Conflicting PFSenseV2 authentication methods",
                    format!(
                        "Either an API token or a username and password may be configured, not both. \
                         Remove api_token ({}) or username/password ({}/{}).",
                        API_TOKEN.env, USERNAME.env, PASSWORD.env
                    ),
                );
                None
            }
            (_, _, Some(token)) => Some(Authorization::api_key(token)),
            (Some(username), Some(password), None) => {
                Some(Authorization::basic(username, password))
            }
            (Some(_), None, None) => {
                PASSWORD.missing(diags);
                None
            }
            (None, Some(_), None) => {
                USERNAME.missing(diags);
                None
            }
            (None, None, None) => {
                diags.add_error(
                    "Missing PFSenseV2 credentials",
                    format!(
                        "The provider cannot create the API client as no credentials are configured. \
                         Set api_token (or {}), or username and password (or {} and {}).",
                        API_TOKEN.env, USERNAME.env, PASSWORD.env
                    ),
                );
                None
            }
        };

        if diags.has_error() {
            return None;
        }

        let connection = connection?;
        let authorization = authorization?;
        debug!(
            url = %connection.url,
            insecure = connection.insecure,
            auth = authorization.kind(),
            "resolved provider configuration"
        );

        Some(ResolvedConfig {
            connection,
            authorization,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn known(value: &str) -> ConfigValue<String> {
        ConfigValue::Known(value.to_string())
    }

    fn summaries(diags: &Diagnostics) -> Vec<&str> {
        diags.iter().map(|d| d.summary.as_str()).collect()
    }

    #[test]
    fn explicit_api_token_config() {
        let model = ProviderModel {
            url: known("https://192.168.1.1"),
            api_token: known("0123456789abcdef"),
            ..ProviderModel::default()
        };
        let mut diags = Diagnostics::new();
        let resolved = model.resolve(&env(&[]), &mut diags).unwrap();

        assert!(diags.is_empty());
        assert_eq!(resolved.connection.url, "https://192.168.1.1");
        assert!(!resolved.connection.insecure);
        assert_eq!(resolved.authorization.kind(), "api_key");
    }

    #[test]
    fn environment_fallback_for_basic_auth() {
        let model = ProviderModel::default();
        let vars = env(&[
            (ENV_URL, "https://fw.example.com"),
            (ENV_USERNAME, "admin"),
            (ENV_PASSWORD, "pfsense"),
            (ENV_INSECURE, "1"),
        ]);
        let mut diags = Diagnostics::new();
        let resolved = model.resolve(&vars, &mut diags).unwrap();

        assert_eq!(resolved.connection.url, "https://fw.example.com");
        assert!(resolved.connection.insecure);
        assert_eq!(resolved.authorization.kind(), "basic");
    }

    #[test]
    fn explicit_config_wins_over_environment() {
        let model = ProviderModel {
            url: known("https://10.0.0.1"),
            insecure: ConfigValue::Known(false),
            ..ProviderModel::default()
        };
        let vars = env(&[
            (ENV_URL, "https://ignored.example.com"),
            (ENV_INSECURE, "true"),
            (ENV_API_TOKEN, "abc"),
        ]);
        let mut diags = Diagnostics::new();
        let resolved = model.resolve(&vars, &mut diags).unwrap();

        assert_eq!(resolved.connection.url, "https://10.0.0.1");
        assert!(!resolved.connection.insecure);
    }

    #[test]
    fn insecure_env_values() {
        assert!(env_flag("1"));
        assert!(env_flag("yes"));
        assert!(env_flag("TRUE"));
        assert!(!env_flag(""));
        assert!(!env_flag("0"));
        assert!(!env_flag("False"));
        assert!(!env_flag("no"));
    }

    #[test]
    fn unknown_values_stop_before_resolution() {
        let model = ProviderModel {
            url: ConfigValue::Unknown,
            insecure: ConfigValue::Unknown,
            api_token: ConfigValue::Unknown,
            ..ProviderModel::default()
        };
        let mut diags = Diagnostics::new();
        assert!(model.resolve(&env(&[]), &mut diags).is_none());
        assert_eq!(
            summaries(&diags),
            vec![
                "Unknown PFSenseV2 URL",
                "Unknown PFSenseV2 API Client Token",
                "Unknown PFSenseV2 Insecure Flag",
            ]
        );
    }

    #[test]
    fn missing_everything_reports_all_problems() {
        let mut diags = Diagnostics::new();
        assert!(ProviderModel::default()
            .resolve(&env(&[]), &mut diags)
            .is_none());
        assert_eq!(
            summaries(&diags),
            vec!["Missing PFSenseV2 URL", "Missing PFSenseV2 credentials"]
        );
        let url_diag = diags.iter().next().unwrap();
        assert_eq!(url_diag.attribute, Some(AttributePath::root("url")));
        assert!(url_diag.detail.contains(ENV_URL));
    }

    #[test]
    fn empty_explicit_url_is_missing() {
        let model = ProviderModel {
            url: known(""),
            api_token: known("abc"),
            ..ProviderModel::default()
        };
        let vars = env(&[(ENV_URL, "https://from-env.example.com")]);
        let mut diags = Diagnostics::new();
        assert!(model.resolve(&vars, &mut diags).is_none());
        assert_eq!(summaries(&diags), vec!["Missing PFSenseV2 URL"]);
    }

    #[test]
    fn invalid_url() {
        let model = ProviderModel {
            url: known("192.168.1.1"),
            api_token: known("abc"),
            ..ProviderModel::default()
        };
        let mut diags = Diagnostics::new();
        assert!(model.resolve(&env(&[]), &mut diags).is_none());
        assert_eq!(summaries(&diags), vec!["Invalid PFSenseV2 URL"]);
    }

    #[test]
    fn conflicting_auth_methods() {
        let model = ProviderModel {
            url: known("https://192.168.1.1"),
            username: known("admin"),
            ..ProviderModel::default()
        };
        let vars = env(&[(ENV_API_TOKEN, "abc")]);
        let mut diags = Diagnostics::new();
        assert!(model.resolve(&vars, &mut diags).is_none());
        assert_eq!(
            summaries(&diags),
            vec!["Conflicting PFSenseV2 authentication methods"]
        );
        assert_eq!(
            diags.iter().next().unwrap().attribute,
            Some(AttributePath::root("api_token"))
        );
    }

    #[test]
    fn partial_basic_credentials() {
        let model = ProviderModel {
            url: known("https://192.168.1.1"),
            username: known("admin"),
            ..ProviderModel::default()
        };
        let mut diags = Diagnostics::new();
        assert!(model.resolve(&env(&[]), &mut diags).is_none());
        assert_eq!(summaries(&diags), vec!["Missing PFSenseV2 API Client Password"]);

        let model = ProviderModel {
            url: known("https://192.168.1.1"),
            password: known("secret"),
            ..ProviderModel::default()
        };
        let mut diags = Diagnostics::new();
        assert!(model.resolve(&env(&[]), &mut diags).is_none());
        assert_eq!(summaries(&diags), vec!["Missing PFSenseV2 API Client Username"]);
    }

    #[test]
    fn deserialize_model_rejects_unknown_fields() {
        let model: ProviderModel = serde_json::from_str(
            r#"{"url": "https://192.168.1.1", "insecure": true, "api_token": "abc"}"#,
        )
        .unwrap();
        assert_eq!(model.insecure, ConfigValue::Known(true));
        assert!(model.username.is_null());

        assert!(serde_json::from_str::<ProviderModel>(r#"{"token": "abc"}"#).is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let model = ProviderModel {
            password: known("hunter2"),
            api_token: known("0123456789abcdef"),
            ..ProviderModel::default()
        };
        let text = format!("{model:?}");
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("0123456789abcdef"));
        assert!(text.contains("[REDACTED]"));
    }
}
