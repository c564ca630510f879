//! Hub configuration.
//!
//! Loaded from a JSON file (`config.json` by default). Per-plugin sections
//! are opaque to the hub and passed through to the plugin at construction.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use synapse_core::PluginId;
use synapse_plugin::PluginConfig;
use thiserror::Error;

/// Configuration load errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Hub configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Feature gates.
    pub features: Features,

    /// Plugin that handles free text with no matching trigger.
    pub default_plugin: PluginId,

    /// Watchdog poll interval (seconds).
    pub watchdog_interval_secs: u64,

    /// Opaque per-plugin configuration, keyed by plugin id.
    pub plugins: HashMap<String, serde_json::Value>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP bind address.
    pub bind_addr: String,
}

/// Feature gates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Gates watchdog startup.
    pub scheduler_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            features: Features::default(),
            default_plugin: PluginId::new("system"),
            watchdog_interval_secs: 2,
            plugins: HashMap::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Default for Features {
    fn default() -> Self {
        Self {
            scheduler_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Opaque configuration map for one plugin (empty if absent).
    pub fn plugin_config(&self, id: &PluginId) -> PluginConfig {
        match self.plugins.get(id.as_str()) {
            Some(serde_json::Value::Object(map)) => map.clone(),
            _ => PluginConfig::new(),
        }
    }

    /// Whether a plugin is enabled in config. Absent sections mean enabled.
    pub fn plugin_enabled(&self, id: &PluginId) -> bool {
        self.plugin_config(id)
            .get("enabled")
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }
}
