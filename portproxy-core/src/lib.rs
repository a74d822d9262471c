//! Core library for managing the Windows port proxy table
//!
//! Lists, adds and deletes `netsh interface portproxy` rules by running the
//! utility and parsing its human-readable output into typed records.

pub mod codepage;
pub mod config;
pub mod elevation;
pub mod encoder;
pub mod error;
pub mod invoker;
pub mod parser;
pub mod repository;
pub mod rule;

pub use config::{Config, ConfigLoader};
pub use error::{MalformedReason, PortProxyError, Result};
pub use invoker::{CommandInvoker, CommandOutput, ConfiguredInvoker, SystemInvoker, TimeoutInvoker};
pub use repository::PortProxyRepository;
pub use rule::{AddOptions, Rule, RuleGroup, RuleKey};
