//! The `configs` data source: hostname, domain and firewall rules of an
//! appliance.

use crate::diagnostics::Diagnostics;
use crate::plugin::{DataSource, ProviderData};
use crate::schema::{Attribute, Schema};
use crate::validators::{OneOf, PortRangeOrNull};
use async_trait::async_trait;
use pfsense_api::models::{FirewallRuleType, IpProtocol, Protocol};
use pfsense_api::{BaseConfig, FirewallRule, FirewallRules, PfSenseApi};
use pfsense_core::Error;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{trace, warn};

/// State of one firewall rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallRuleModel {
    /// Rule action
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Interfaces the rule is bound to
    pub interfaces: Vec<String>,
    /// Disabled flag
    pub disabled: bool,
    /// Address family
    pub address_family: String,
    /// Log flag
    pub log: bool,
    /// Description
    pub description: String,
    /// Protocol, null for any
    pub protocol: Option<String>,
    /// Source address
    pub source: Option<String>,
    /// Source port or range
    pub source_port: Option<String>,
    /// Destination address
    pub destination: Option<String>,
    /// Destination port or range
    pub destination_port: Option<String>,
}

impl From<&FirewallRule> for FirewallRuleModel {
    fn from(rule: &FirewallRule) -> Self {
        Self {
            rule_type: rule.rule_type.clone(),
            interfaces: rule.interfaces.clone(),
            disabled: rule.disabled,
            address_family: rule.address_family.clone(),
            log: rule.log,
            description: rule.description.clone(),
            protocol: rule.protocol.clone(),
            source: rule.source.clone(),
            source_port: rule.source_port.clone(),
            destination: rule.destination.clone(),
            destination_port: rule.destination_port.clone(),
        }
    }
}

/// State of the `configs` data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PfSenseModel {
    /// Same as the hostname
    pub id: String,
    /// Host name
    pub hostname: String,
    /// DNS domain
    pub domain: String,
    /// Every firewall rule, in rule order
    pub firewall_rules: Vec<FirewallRuleModel>,
    /// Rules bound to the `wan` interface
    pub wan_rules: Vec<FirewallRuleModel>,
}

impl PfSenseModel {
    /// Build the state from what the appliance returned.
    #[must_use]
    pub fn new(base: BaseConfig, rules: &FirewallRules) -> Self {
        Self {
            id: base.hostname.clone(),
            hostname: base.hostname,
            domain: base.domain,
            firewall_rules: rules.iter().map(FirewallRuleModel::from).collect(),
            wan_rules: rules
                .wan_rules()
                .into_iter()
                .map(FirewallRuleModel::from)
                .collect(),
        }
    }
}

fn rule_attributes() -> Vec<(&'static str, Attribute)> {
    vec![
        (
            "type",
            Attribute::string("Rule action.")
                .required()
                .with_validator(OneOf::new(FirewallRuleType::wire_values())),
        ),
        (
            "interfaces",
            Attribute::string_list("Interfaces the rule is bound to.").optional(),
        ),
        ("disabled", Attribute::bool("Whether the rule is disabled.").optional()),
        (
            "address_family",
            Attribute::string("IP version the rule applies to.")
                .optional()
                .with_validator(OneOf::new(IpProtocol::wire_values())),
        ),
        ("log", Attribute::bool("Whether matching packets are logged.").optional()),
        ("description", Attribute::string("Rule description.").optional()),
        (
            "protocol",
            Attribute::string("Protocol matched by the rule, null for any.")
                .optional()
                .with_validator(OneOf::new(Protocol::wire_values())),
        ),
        ("source", Attribute::string("Source address.").optional()),
        (
            "source_port",
            Attribute::string("Source port.")
                .optional()
                .with_validator(PortRangeOrNull),
        ),
        ("destination", Attribute::string("Destination address.").optional()),
        (
            "destination_port",
            Attribute::string("Destination port.")
                .optional()
                .with_validator(PortRangeOrNull),
        ),
    ]
}

fn client_error(diags: &mut Diagnostics, what: &str, err: &Error) {
    if err.should_log() {
        warn!(code = err.error_code(), error = %err, "unexpected pfSense read failure");
    }
    diags.add_error(
        "Client Error",
        format!("Unable to read {what}, got error: {err}"),
    );
}

/// Reads the base configuration and firewall rules of a pfSense appliance.
#[derive(Default)]
pub struct ConfigsDataSource {
    client: Option<Arc<dyn PfSenseApi>>,
}

impl ConfigsDataSource {
    /// Unconfigured instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Boxed instance for registration.
    #[must_use]
    pub fn boxed() -> Box<dyn DataSource> {
        Box::new(Self::new())
    }

    /// Whether a client was handed over by the provider.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl DataSource for ConfigsDataSource {
    fn type_name_suffix(&self) -> &'static str {
        "configs"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "pfSense base configuration and firewall rules.",
            [
                ("id", Attribute::string("Identifier, same as the hostname.").computed()),
                ("hostname", Attribute::string("Host name of the appliance.").computed()),
                ("domain", Attribute::string("DNS domain of the appliance.").computed()),
                (
                    "firewall_rules",
                    Attribute::nested_list("All firewall rules.", rule_attributes())
                        .optional()
                        .computed(),
                ),
                (
                    "wan_rules",
                    Attribute::nested_list("Firewall rules on the WAN interface.", rule_attributes())
                        .optional()
                        .computed(),
                ),
            ],
        )
    }

    fn configure(&mut self, provider_data: Option<&ProviderData>, _diags: &mut Diagnostics) {
        if let Some(data) = provider_data {
            self.client = Some(data.client());
        }
    }

    async fn read(&self, config: &Value, diags: &mut Diagnostics) -> Option<Value> {
        self.schema().validate_config(config, diags);
        if diags.has_error() {
            return None;
        }

        let Some(client) = &self.client else {
            diags.add_error(
                "Unconfigured Data Source",
                "Expected a configured pfSense client. Please report this issue to the provider developers.",
            );
            return None;
        };

        let base = client
            .get_base_config()
            .await
            .map_err(|err| client_error(diags, "base config", &err))
            .ok();
        let rules = client
            .get_firewall_rules()
            .await
            .map_err(|err| client_error(diags, "firewall rules", &err))
            .ok();

        let (base, rules) = (base?, rules?);
        let state = PfSenseModel::new(base, &rules);

        trace!(
            hostname = %state.hostname,
            rules = state.firewall_rules.len(),
            wan_rules = state.wan_rules.len(),
            "read a data source"
        );

        match serde_json::to_value(&state) {
            Ok(value) => Some(value),
            Err(err) => {
                diags.add_error("Unable to Save State", err.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use pfsense_api::models::FirewallRuleRecord;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    mock! {
        Api {}

        #[async_trait]
        impl PfSenseApi for Api {
            async fn get_base_config(&self) -> pfsense_api::Result<BaseConfig>;
            async fn get_firewall_rules(&self) -> pfsense_api::Result<FirewallRules>;
        }
    }

    fn base() -> BaseConfig {
        BaseConfig {
            hostname: "fw01".to_string(),
            domain: "example.com".to_string(),
        }
    }

    fn rules() -> FirewallRules {
        let records: Vec<FirewallRuleRecord> = serde_json::from_value(json!([
            {
                "id": 0,
                "type": "pass",
                "interface": ["lan"],
                "ipprotocol": "inet",
                "protocol": null,
                "source": "lan",
                "destination": "any",
                "descr": "Default allow LAN to any rule"
            },
            {
                "id": 1,
                "type": "pass",
                "interface": ["wan"],
                "ipprotocol": "inet",
                "protocol": "tcp",
                "source": "any",
                "destination": "wan:ip",
                "destination_port": "443",
                "log": true
            }
        ]))
        .unwrap();
        records.into_iter().map(FirewallRule::from).collect()
    }

    /// Counts requests that overlap in time.
    #[derive(Default)]
    struct InFlightApi {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl InFlightApi {
        async fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl PfSenseApi for InFlightApi {
        async fn get_base_config(&self) -> pfsense_api::Result<BaseConfig> {
            self.enter().await;
            Ok(base())
        }

        async fn get_firewall_rules(&self) -> pfsense_api::Result<FirewallRules> {
            self.enter().await;
            Ok(rules())
        }
    }

    fn configured(api: impl PfSenseApi + 'static) -> ConfigsDataSource {
        let mut data_source = ConfigsDataSource::new();
        let data = ProviderData::new(Arc::new(api));
        data_source.configure(Some(&data), &mut Diagnostics::new());
        data_source
    }

    #[tokio::test]
    async fn read_builds_state() {
        let mut api = MockApi::new();
        api.expect_get_base_config().times(1).returning(|| Ok(base()));
        api.expect_get_firewall_rules().times(1).returning(|| Ok(rules()));

        let mut diags = Diagnostics::new();
        let state = configured(api).read(&json!({}), &mut diags).await.unwrap();

        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(state["id"], "fw01");
        assert_eq!(state["hostname"], "fw01");
        assert_eq!(state["domain"], "example.com");
        assert_eq!(state["firewall_rules"].as_array().unwrap().len(), 2);

        let first = &state["firewall_rules"][0];
        assert_eq!(first["type"], "pass");
        assert_eq!(first["address_family"], "inet");
        assert_eq!(first["protocol"], Value::Null);
        assert_eq!(first["source_port"], Value::Null);
        assert_eq!(first["description"], "Default allow LAN to any rule");
        assert_eq!(first["disabled"], false);

        let wan = state["wan_rules"].as_array().unwrap();
        assert_eq!(wan.len(), 1);
        assert_eq!(wan[0]["protocol"], "tcp");
        assert_eq!(wan[0]["destination_port"], "443");
        assert_eq!(wan[0]["description"], "");
        assert_eq!(wan[0]["log"], true);
    }

    #[tokio::test]
    async fn requests_run_one_at_a_time() {
        let api = Arc::new(InFlightApi::default());
        let mut data_source = ConfigsDataSource::new();
        let data = ProviderData::new(Arc::clone(&api) as Arc<dyn PfSenseApi>);
        data_source.configure(Some(&data), &mut Diagnostics::new());

        let mut diags = Diagnostics::new();
        assert!(data_source.read(&json!({}), &mut diags).await.is_some());
        assert_eq!(api.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unlisted_rule_values_reach_state() {
        let records: Vec<FirewallRuleRecord> = serde_json::from_value(json!([{
            "type": "pass",
            "interface": ["wan"],
            "ipprotocol": "inet",
            "protocol": "sctp",
            "source": "any",
            "destination": "any"
        }]))
        .unwrap();
        let unlisted: FirewallRules = records.into_iter().map(FirewallRule::from).collect();

        let mut api = MockApi::new();
        api.expect_get_base_config().returning(|| Ok(base()));
        api.expect_get_firewall_rules()
            .returning(move || Ok(unlisted.clone()));

        let mut diags = Diagnostics::new();
        let state = configured(api).read(&json!({}), &mut diags).await.unwrap();
        assert_eq!(state["wan_rules"][0]["protocol"], "sctp");
    }

    #[tokio::test]
    async fn unexpected_response_is_a_client_error() {
        let mut api = MockApi::new();
        api.expect_get_base_config().returning(|| Ok(base()));
        api.expect_get_firewall_rules().returning(|| {
            Err(Error::UnexpectedResponse("no data retrieving firewall rules".to_string()))
        });

        let mut diags = Diagnostics::new();
        assert!(configured(api).read(&json!({}), &mut diags).await.is_none());
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.summary, "Client Error");
        assert!(diag.detail.contains("no data retrieving firewall rules"));
    }

    #[tokio::test]
    async fn empty_rule_list() {
        let mut api = MockApi::new();
        api.expect_get_base_config().returning(|| Ok(base()));
        api.expect_get_firewall_rules()
            .returning(|| Ok(FirewallRules::default()));

        let mut diags = Diagnostics::new();
        let state = configured(api).read(&Value::Null, &mut diags).await.unwrap();
        assert_eq!(state["firewall_rules"], json!([]));
        assert_eq!(state["wan_rules"], json!([]));
    }

    #[tokio::test]
    async fn base_config_failure_reports_client_error() {
        let mut api = MockApi::new();
        api.expect_get_base_config()
            .returning(|| Err(Error::Unauthorized("invalid credentials".to_string())));
        api.expect_get_firewall_rules().returning(|| Ok(rules()));

        let mut diags = Diagnostics::new();
        assert!(configured(api).read(&json!({}), &mut diags).await.is_none());

        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.summary, "Client Error");
        assert!(diag
            .detail
            .starts_with("Unable to read base config, got error: "));
        assert!(diag.detail.contains("invalid credentials"));
    }

    #[tokio::test]
    async fn both_failures_are_reported() {
        let mut api = MockApi::new();
        api.expect_get_base_config()
            .returning(|| Err(Error::ServiceUnavailable("503".to_string())));
        api.expect_get_firewall_rules()
            .returning(|| Err(Error::ParseError("expected array".to_string())));

        let mut diags = Diagnostics::new();
        assert!(configured(api).read(&json!({}), &mut diags).await.is_none());

        let details: Vec<&str> = diags.iter().map(|d| d.detail.as_str()).collect();
        assert_eq!(details.len(), 2);
        assert!(details[0].starts_with("Unable to read base config"));
        assert!(details[1].starts_with("Unable to read firewall rules"));
    }

    #[tokio::test]
    async fn unconfigured_read_is_an_error() {
        let data_source = ConfigsDataSource::new();
        assert!(!data_source.is_configured());

        let mut diags = Diagnostics::new();
        assert!(data_source.read(&json!({}), &mut diags).await.is_none());
        assert_eq!(
            diags.iter().next().unwrap().summary,
            "Unconfigured Data Source"
        );
    }

    #[tokio::test]
    async fn configure_without_provider_data_is_a_no_op() {
        let mut data_source = ConfigsDataSource::new();
        let mut diags = Diagnostics::new();
        data_source.configure(None, &mut diags);
        assert!(diags.is_empty());
        assert!(!data_source.is_configured());
    }

    #[tokio::test]
    async fn invalid_config_skips_fetch() {
        let mut api = MockApi::new();
        api.expect_get_base_config().never();
        api.expect_get_firewall_rules().never();

        let mut diags = Diagnostics::new();
        let config = json!({
            "hostname": "fw02",
            "firewall_rules": [{
                "type": "allow",
                "interfaces": ["wan"],
                "address_family": "inet",
                "source": "any",
                "destination": "any",
                "destination_port": "80:70000"
            }]
        });
        assert!(configured(api).read(&config, &mut diags).await.is_none());

        let paths: Vec<String> = diags
            .iter()
            .filter_map(|d| d.attribute.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(
            paths,
            vec![
                "firewall_rules[0].destination_port",
                "firewall_rules[0].type",
                "hostname",
            ]
        );
    }

    #[test]
    fn schema_lists_rule_attributes() {
        let schema = ConfigsDataSource::new().schema();
        for name in ["id", "hostname", "domain", "firewall_rules", "wan_rules"] {
            assert!(schema.attribute(name).is_some(), "{name} missing");
        }
        assert!(schema.attribute("id").unwrap().computed);

        let json = serde_json::to_value(&schema).unwrap();
        let rule = json["attributes"]["firewall_rules"]["nested"].as_object().unwrap();
        let required: Vec<&str> = rule
            .iter()
            .filter(|(_, attribute)| attribute["required"] == true)
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(required, vec!["type"]);
        assert!(!schema.attribute("id").unwrap().optional);

        let nested = &json["attributes"]["firewall_rules"]["nested"];
        assert_eq!(nested["type"]["validators"][0], r#"value must be one of: ["pass","block","reject"]"#);
        assert!(nested["protocol"]["validators"][0]
            .as_str()
            .unwrap()
            .contains(r#""tcp/udp""#));
    }
}
