//! Configuration schema types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete, resolved configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub netsh: NetshConfig,
    pub cli: CliConfig,
}

/// How the external utility is invoked
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetshConfig {
    /// Program name or path
    pub program: String,

    /// Deadline for a single invocation in seconds, `0` for none
    pub timeout_secs: u64,
}

impl NetshConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Front-end behaviour
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Ask before deleting rules
    pub confirm_delete: bool,

    /// Re-list the table after every change
    pub refresh_after_change: bool,
}

/// A configuration file layered on top of lower-priority settings
///
/// Every field is optional; only the ones present override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverlay {
    #[serde(default)]
    pub netsh: NetshOverlay,
    #[serde(default)]
    pub cli: CliOverlay,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetshOverlay {
    pub program: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliOverlay {
    pub confirm_delete: Option<bool>,
    pub refresh_after_change: Option<bool>,
}

impl Config {
    /// Apply the fields present in `overlay`
    pub fn apply(&mut self, overlay: ConfigOverlay) {
        if let Some(program) = overlay.netsh.program {
            self.netsh.program = program;
        }
        if let Some(secs) = overlay.netsh.timeout_secs {
            self.netsh.timeout_secs = secs;
        }
        if let Some(confirm) = overlay.cli.confirm_delete {
            self.cli.confirm_delete = confirm;
        }
        if let Some(refresh) = overlay.cli.refresh_after_change {
            self.cli.refresh_after_change = refresh;
        }
    }
}
