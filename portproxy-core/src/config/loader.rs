//! Configuration file discovery and layering

use super::builtin;
use super::schema::{Config, ConfigOverlay};
use crate::error::{PortProxyError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "portproxy";
const CONFIG_FILE: &str = "config.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Find the user config by checking the environment and standard locations
    pub fn find_user_config() -> Option<PathBuf> {
        // 1. $PORTPROXY_CONFIG
        if let Ok(path) = env::var("PORTPROXY_CONFIG") {
            let p = PathBuf::from(path);
            if p.exists() {
                return Some(p);
            }
        }

        // 2. %APPDATA%\portproxy\config.toml
        // 3. $XDG_CONFIG_HOME/portproxy/config.toml
        for var in ["APPDATA", "XDG_CONFIG_HOME"] {
            if let Ok(dir) = env::var(var) {
                let p = PathBuf::from(dir).join(CONFIG_DIR).join(CONFIG_FILE);
                if p.exists() {
                    return Some(p);
                }
            }
        }

        // 4. ~/.config/portproxy/config.toml
        let home = env::var("HOME").or_else(|_| env::var("USERPROFILE")).ok()?;
        let p = PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR)
            .join(CONFIG_FILE);
        p.exists().then_some(p)
    }

    /// Load one overlay file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ConfigOverlay> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| PortProxyError::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })?;

        let overlay: ConfigOverlay = toml::from_str(&contents)?;
        Ok(overlay)
    }

    /// Apply overlay files over the built-in config, later files winning
    pub fn load_layers(paths: &[PathBuf]) -> Result<Config> {
        let mut config = builtin::get_builtin().clone();

        for path in paths {
            tracing::debug!("Loading config from {:?}", path);
            config.apply(Self::load_from_file(path)?);
        }

        Ok(config)
    }

    /// Load with full priority order: built-in < user < explicit
    pub fn load_with_priority(explicit_config: Option<PathBuf>) -> Result<Config> {
        let mut paths = Vec::new();

        if let Some(user_path) = Self::find_user_config() {
            paths.push(user_path);
        }

        // An explicit --config must exist; a missing user config is simply skipped
        if let Some(explicit_path) = explicit_config {
            paths.push(explicit_path);
        }

        if paths.is_empty() {
            tracing::debug!("No config files found, using built-in defaults");
        }

        Self::load_layers(&paths)
    }
}
