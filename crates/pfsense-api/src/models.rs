//! Wire models for the pfSense REST API v2 and the projections built from
//! them.

use pfsense_core::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generates a closed string enum with its wire spellings.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the value as spelled on the wire.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            /// Wire spellings of every variant.
            #[must_use]
            pub fn wire_values() -> Vec<&'static str> {
                Self::ALL.iter().map(Self::as_str).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(Error::ValidationError(format!(
                        concat!("unknown ", stringify!($name), " `{}`"),
                        other
                    ))),
                }
            }
        }
    };
}

wire_enum! {
    /// Action taken when a rule matches.
    FirewallRuleType {
        /// Allow the traffic
        Pass => "pass",
        /// Silently drop the traffic
        Block => "block",
        /// Drop and answer with RST / ICMP unreachable
        Reject => "reject",
    }
}

wire_enum! {
    /// Address family a rule applies to.
    IpProtocol {
        /// IPv4
        Inet => "inet",
        /// IPv6
        Inet6 => "inet6",
        /// IPv4 and IPv6
        Inet46 => "inet46",
    }
}

wire_enum! {
    /// IP protocol matched by a rule. Absent means any protocol.
    Protocol {
        /// Authentication Header
        Ah => "ah",
        /// Common Address Redundancy Protocol
        Carp => "carp",
        /// Encapsulating Security Payload
        Esp => "esp",
        /// Generic Routing Encapsulation
        Gre => "gre",
        /// ICMP
        Icmp => "icmp",
        /// IGMP
        Igmp => "igmp",
        /// IPv6 encapsulation
        Ipv6 => "ipv6",
        /// OSPF
        Ospf => "ospf",
        /// pfsync state synchronisation
        Pfsync => "pfsync",
        /// PIM
        Pim => "pim",
        /// TCP
        Tcp => "tcp",
        /// TCP or UDP
        TcpUdp => "tcp/udp",
        /// UDP
        Udp => "udp",
    }
}

/// Success envelope wrapping every v2 response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    /// HTTP status echoed in the body.
    pub code: Option<u16>,
    /// Short status string, `ok` on success.
    pub status: Option<String>,
    /// Response identifier, `SUCCESS` on success.
    pub response_id: Option<String>,
    /// Human readable message.
    pub message: Option<String>,
    /// Payload.
    pub data: Option<T>,
}

/// Payload of `GET /api/v2/system/hostname`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemHostname {
    /// Host name without domain.
    pub hostname: Option<String>,
    /// DNS domain.
    pub domain: Option<String>,
}

/// A firewall rule as returned by `GET /api/v2/firewall/rules`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FirewallRuleRecord {
    /// Position of the rule in the rule list.
    pub id: Option<u32>,
    /// Rule action, normally one of [`FirewallRuleType`].
    #[serde(rename = "type", default)]
    pub rule_type: String,
    /// Interfaces the rule is bound to.
    #[serde(default)]
    pub interface: Vec<String>,
    /// Address family, normally one of [`IpProtocol`].
    #[serde(default)]
    pub ipprotocol: String,
    /// Protocol, `null` for any, normally one of [`Protocol`].
    pub protocol: Option<String>,
    /// Source address expression.
    pub source: Option<String>,
    /// Source port or range, `null` for any.
    pub source_port: Option<String>,
    /// Destination address expression.
    pub destination: Option<String>,
    /// Destination port or range, `null` for any.
    pub destination_port: Option<String>,
    /// Description.
    pub descr: Option<String>,
    /// Whether the rule is disabled.
    #[serde(default)]
    pub disabled: bool,
    /// Whether matching packets are logged.
    #[serde(default)]
    pub log: bool,
    /// Floating rule flag.
    #[serde(default)]
    pub floating: bool,
    /// Quick match (floating rules only).
    #[serde(default)]
    pub quick: bool,
    /// Direction for floating rules (`in`, `out`, `any`).
    pub direction: Option<String>,
    /// Rule tracker identifier.
    pub tracker: Option<u64>,
    /// Gateway for policy routing.
    pub gateway: Option<String>,
    /// State tracking type.
    pub statetype: Option<String>,
}

/// Hostname and domain of the appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseConfig {
    /// Host name.
    pub hostname: String,
    /// DNS domain.
    pub domain: String,
}

impl TryFrom<SystemHostname> for BaseConfig {
    type Error = Error;

    fn try_from(value: SystemHostname) -> Result<Self, Self::Error> {
        match (value.hostname, value.domain) {
            (Some(hostname), Some(domain)) => Ok(Self { hostname, domain }),
            (None, _) => Err(Error::UnexpectedResponse(
                "hostname missing from system hostname response".to_string(),
            )),
            (_, None) => Err(Error::UnexpectedResponse(
                "domain missing from system hostname response".to_string(),
            )),
        }
    }
}

/// Firewall rule fields exposed to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallRule {
    /// Rule action as sent by the appliance.
    pub rule_type: String,
    /// Interfaces the rule is bound to.
    pub interfaces: Vec<String>,
    /// Whether the rule is disabled.
    pub disabled: bool,
    /// Address family as sent by the appliance.
    pub address_family: String,
    /// Whether matching packets are logged.
    pub log: bool,
    /// Description, empty when unset.
    pub description: String,
    /// Protocol, `None` for any.
    pub protocol: Option<String>,
    /// Source address expression.
    pub source: Option<String>,
    /// Source port or range.
    pub source_port: Option<String>,
    /// Destination address expression.
    pub destination: Option<String>,
    /// Destination port or range.
    pub destination_port: Option<String>,
}

impl FirewallRule {
    /// Whether the rule is bound to the named interface.
    #[must_use]
    pub fn applies_to(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|iface| iface == interface)
    }
}

impl From<FirewallRuleRecord> for FirewallRule {
    fn from(record: FirewallRuleRecord) -> Self {
        Self {
            rule_type: record.rule_type,
            interfaces: record.interface,
            disabled: record.disabled,
            address_family: record.ipprotocol,
            log: record.log,
            description: record.descr.unwrap_or_default(),
            protocol: record.protocol,
            source: record.source,
            source_port: record.source_port,
            destination: record.destination,
            destination_port: record.destination_port,
        }
    }
}

/// Ordered list of firewall rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FirewallRules(Vec<FirewallRule>);

impl FirewallRules {
    /// Wrap a list of rules, keeping their order.
    #[must_use]
    pub fn new(rules: Vec<FirewallRule>) -> Self {
        Self(rules)
    }

    /// Rules bound to the given interface, in order.
    #[must_use]
    pub fn on_interface(&self, interface: &str) -> Vec<&FirewallRule> {
        self.0.iter().filter(|rule| rule.applies_to(interface)).collect()
    }

    /// Rules bound to the WAN interface.
    #[must_use]
    pub fn wan_rules(&self) -> Vec<&FirewallRule> {
        self.on_interface("wan")
    }

    /// Iterate over the rules.
    pub fn iter(&self) -> std::slice::Iter<'_, FirewallRule> {
        self.0.iter()
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the underlying vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<FirewallRule> {
        self.0
    }
}

impl FromIterator<FirewallRule> for FirewallRules {
    fn from_iter<I: IntoIterator<Item = FirewallRule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for FirewallRules {
    type Item = FirewallRule;
    type IntoIter = std::vec::IntoIter<FirewallRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FirewallRules {
    type Item = &'a FirewallRule;
    type IntoIter = std::slice::Iter<'a, FirewallRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule_on(interfaces: &[&str]) -> FirewallRule {
        FirewallRule {
            rule_type: "pass".into(),
            interfaces: interfaces.iter().map(ToString::to_string).collect(),
            disabled: false,
            address_family: "inet".into(),
            log: false,
            description: String::new(),
            protocol: None,
            source: Some("any".into()),
            source_port: None,
            destination: Some("any".into()),
            destination_port: None,
        }
    }

    #[test]
    fn protocol_wire_spelling() {
        assert_eq!(Protocol::TcpUdp.as_str(), "tcp/udp");
        assert_eq!("tcp/udp".parse::<Protocol>().unwrap(), Protocol::TcpUdp);
        assert_eq!(
            serde_json::to_value(Protocol::TcpUdp).unwrap(),
            json!("tcp/udp")
        );
        assert_eq!(Protocol::ALL.len(), 13);
    }

    #[test]
    fn unknown_enum_value_is_rejected() {
        let err = "allow".parse::<FirewallRuleType>().unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
        assert!(serde_json::from_value::<IpProtocol>(json!("inet4")).is_err());
    }

    #[test]
    fn base_config_requires_both_fields() {
        let complete = SystemHostname {
            hostname: Some("fw01".into()),
            domain: Some("home.arpa".into()),
        };
        let base = BaseConfig::try_from(complete).unwrap();
        assert_eq!(base.hostname, "fw01");
        assert_eq!(base.domain, "home.arpa");

        let missing = SystemHostname {
            hostname: Some("fw01".into()),
            domain: None,
        };
        assert!(matches!(
            BaseConfig::try_from(missing),
            Err(Error::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn record_projection_copies_fields() {
        let record: FirewallRuleRecord = serde_json::from_value(json!({
            "id": 3,
            "type": "block",
            "interface": ["wan", "opt1"],
            "ipprotocol": "inet6",
            "protocol": "tcp",
            "source": "!10.0.0.0/8",
            "source_port": null,
            "destination": "wan:ip",
            "destination_port": "443",
            "descr": "Block HTTPS",
            "disabled": true,
            "log": true,
            "statetype": "keep state",
            "created_by": "admin@10.0.0.2 (API)"
        }))
        .unwrap();

        let rule = FirewallRule::from(record);
        assert_eq!(rule.rule_type, "block");
        assert_eq!(rule.interfaces, vec!["wan", "opt1"]);
        assert_eq!(rule.address_family, "inet6");
        assert_eq!(rule.protocol.as_deref(), Some("tcp"));
        assert_eq!(rule.source.as_deref(), Some("!10.0.0.0/8"));
        assert_eq!(rule.source_port, None);
        assert_eq!(rule.destination.as_deref(), Some("wan:ip"));
        assert_eq!(rule.destination_port.as_deref(), Some("443"));
        assert_eq!(rule.description, "Block HTTPS");
        assert!(rule.disabled);
        assert!(rule.log);
    }

    #[test]
    fn unlisted_values_pass_through() {
        let records: Vec<FirewallRuleRecord> = serde_json::from_value(json!([
            {"type": "pass", "interface": ["wan"], "ipprotocol": "inet", "protocol": "sctp"},
            {"type": "match", "interface": ["lan"], "ipprotocol": "inet4"}
        ]))
        .unwrap();

        let rules: FirewallRules = records.into_iter().map(FirewallRule::from).collect();
        assert_eq!(rules.len(), 2);

        let first = rules.iter().next().unwrap();
        assert_eq!(first.protocol.as_deref(), Some("sctp"));
        assert!(first.protocol.as_deref().unwrap().parse::<Protocol>().is_err());

        let second = rules.iter().nth(1).unwrap();
        assert_eq!(second.rule_type, "match");
        assert_eq!(second.address_family, "inet4");
        assert_eq!(second.protocol, None);
    }

    #[test]
    fn wan_rules_keep_order() {
        let rules = FirewallRules::new(vec![
            rule_on(&["lan"]),
            rule_on(&["wan"]),
            rule_on(&["opt1", "wan"]),
        ]);

        let wan = rules.wan_rules();
        assert_eq!(wan.len(), 2);
        assert_eq!(wan[0].interfaces, vec!["wan"]);
        assert_eq!(wan[1].interfaces, vec!["opt1", "wan"]);
        assert_eq!(rules.on_interface("lan").len(), 1);
        assert!(rules.on_interface("opt2").is_empty());
    }

    #[test]
    fn envelope_without_data() {
        let response: ApiResponse<SystemHostname> = serde_json::from_value(json!({
            "code": 200,
            "status": "ok",
            "response_id": "SUCCESS",
            "message": ""
        }))
        .unwrap();
        assert!(response.data.is_none());
    }
}
