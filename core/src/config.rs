//! Application configuration.
//!
//! Loaded from TOML; every section has defaults so a missing file or a
//! partial file is fine. `LUMO_BASE_URL` and `LUMO_LOG` override the file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LumoConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub preferences_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            preferences_path: PathBuf::from("lumo-preferences.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LumoConfig {
    /// Read `path`, or return defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = ?path, "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        debug!(path = ?path, "config loaded");
        Ok(config)
    }

    /// Apply `LUMO_BASE_URL` and `LUMO_LOG` from the environment.
    pub fn apply_env(mut self) -> Self {
        self.apply_overrides(env::var("LUMO_BASE_URL").ok(), env::var("LUMO_LOG").ok());
        self
    }

    fn apply_overrides(&mut self, base_url: Option<String>, level: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(level) = level.filter(|l| !l.is_empty()) {
            self.logging.level = level;
        }
    }
}
