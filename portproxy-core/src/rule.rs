//! Port proxy rule model

use crate::error::{PortProxyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Listen-address token meaning "every local address"
pub const WILDCARD_ADDRESS: &str = "*";

/// Address-family pairing of a rule
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RuleGroup {
    /// Listen on IPv4, connect to IPv4
    #[value(name = "v4tov4")]
    V4ToV4,

    /// Listen on IPv4, connect to IPv6
    #[value(name = "v4tov6")]
    V4ToV6,

    /// Listen on IPv6, connect to IPv4
    #[value(name = "v6tov4")]
    V6ToV4,

    /// Listen on IPv6, connect to IPv6
    #[value(name = "v6tov6")]
    V6ToV6,
}

impl RuleGroup {
    pub const ALL: [RuleGroup; 4] = [
        RuleGroup::V4ToV4,
        RuleGroup::V4ToV6,
        RuleGroup::V6ToV4,
        RuleGroup::V6ToV6,
    ];

    /// Token used on the netsh command line
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleGroup::V4ToV4 => "v4tov4",
            RuleGroup::V4ToV6 => "v4tov6",
            RuleGroup::V6ToV4 => "v6tov4",
            RuleGroup::V6ToV6 => "v6tov6",
        }
    }

    /// Build a group from the listen and connect family digits (4 or 6)
    pub fn from_families(listen: char, connect: char) -> Option<Self> {
        match (listen, connect) {
            ('4', '4') => Some(RuleGroup::V4ToV4),
            ('4', '6') => Some(RuleGroup::V4ToV6),
            ('6', '4') => Some(RuleGroup::V6ToV4),
            ('6', '6') => Some(RuleGroup::V6ToV6),
            _ => None,
        }
    }
}

impl fmt::Display for RuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleGroup {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RuleGroup::ALL
            .into_iter()
            .find(|group| group.as_str() == s)
            .ok_or_else(|| format!("unknown rule group: {s}"))
    }
}

/// A single forwarding entry as reported by the port proxy table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub group: RuleGroup,

    /// Local bind address, an IP literal or `*`
    pub listen_address: String,

    pub listen_port: u16,

    /// Forwarding target address
    pub connect_address: String,

    pub connect_port: u16,
}

impl Rule {
    /// Key that identifies exactly this rule for deletion
    pub fn key(&self) -> RuleKey {
        RuleKey {
            group: self.group,
            listen_port: self.listen_port,
            listen_address: Some(self.listen_address.clone()),
        }
    }
}

/// Identity of a rule: `(group, listen port, listen address)`
///
/// When `listen_address` is `None` the external utility picks its own default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleKey {
    pub group: RuleGroup,
    pub listen_port: u16,
    pub listen_address: Option<String>,
}

/// Optional fields of an add request
///
/// `None` omits the field from the command line. `Some(0)` is a real port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Target port; the utility falls back to the listen port when omitted
    pub connect_port: Option<u16>,

    pub listen_address: Option<String>,
}

/// Accept `*` or an IP literal for the listen side
pub fn validate_listen_address(value: &str) -> Result<String> {
    if value == WILDCARD_ADDRESS || value.parse::<IpAddr>().is_ok() {
        Ok(value.to_string())
    } else {
        Err(PortProxyError::InvalidAddress {
            field: "listen address",
            value: value.to_string(),
        })
    }
}

/// Accept only an IP literal for the connect side
pub fn validate_connect_address(value: &str) -> Result<String> {
    value
        .parse::<IpAddr>()
        .map(|_| value.to_string())
        .map_err(|_| PortProxyError::InvalidAddress {
            field: "connect address",
            value: value.to_string(),
        })
}
