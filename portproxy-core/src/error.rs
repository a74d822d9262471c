//! Error types for port proxy operations

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PortProxyError>;

#[derive(Debug, Error)]
pub enum PortProxyError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    #[error("Command failed with code {code}: {stdout}")]
    ExternalCommand { code: i32, stdout: String },

    #[error("Malformed listing output at line {line_number} ({reason}): {line:?}")]
    MalformedOutput {
        line_number: usize,
        line: String,
        reason: MalformedReason,
    },

    #[error("{program} did not finish within {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("Invalid {field}: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("Failed to load config from {path}: {source}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Why a listing line could not be turned into a rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("data row before any section header")]
    RowBeforeHeader,

    #[error("expected 4 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("unknown address family pair")]
    UnknownGroup,
}
