//! Configuration for the port proxy front-end
//!
//! - schema: Config types and the partial overlay read from files
//! - builtin: embedded defaults
//! - loader: file discovery and layering

pub mod builtin;
pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{CliConfig, Config, ConfigOverlay, NetshConfig};
