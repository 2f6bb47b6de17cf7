//! # Configuration
//!
//! The JSON configuration file, loaded once at start-up and handed to the
//! registry and the state machine as plain values.
//!
//! String values of the form `env:NAME` are replaced by the value of the
//! environment variable `NAME` before the document is deserialized, so
//! secrets can stay out of the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::dependency::{DependencyRef, MalformedDependency};
use crate::network::mac::{HwAddress, InvalidHwAddress};

const ENV_PREFIX: &str = "env:";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration document")]
    Parse(#[from] serde_json::Error),
    #[error("plugin '{plugin}' declares a bad dependency")]
    Dependency {
        plugin: String,
        #[source]
        source: MalformedDependency,
    },
    #[error("network_flows contains a bad address")]
    Address(#[from] InvalidHwAddress),
    #[error("configuration names plugin '{0}' which is not loaded")]
    UnknownPlugin(String),
    #[error("duplicate plugin name '{0}'")]
    DuplicatePlugin(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the file-backed store keeps its snapshot. `None` keeps
    /// everything in memory.
    pub database_path: Option<PathBuf>,
    /// How long one scan session may stay armed before the watchdog
    /// reports it complete.
    pub scan_timeout_secs: Option<u64>,
    pub network_flows: NetworkFlows,
    pub default_plugins: BTreeMap<String, PluginConfig>,
    pub optional_plugins: BTreeMap<String, PluginConfig>,
    pub triggers: TriggerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkFlows {
    pub home_network_mac: Option<String>,
    pub blacklisted_macs: Vec<String>,
    /// Interfaces whose link events are honoured. Empty means all of them.
    pub monitored_interfaces: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginConfig {
    pub enabled: Option<bool>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub plugin_config: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub poll_interval_secs: u64,
    pub cpu_temp_threshold: Option<f32>,
    pub interface_unplugged: bool,
}

/// Which section of the file a plugin entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginSection {
    Default,
    Optional,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            scan_timeout_secs: None,
            network_flows: NetworkFlows::default(),
            default_plugins: BTreeMap::new(),
            optional_plugins: BTreeMap::new(),
            triggers: TriggerConfig::default(),
        }
    }
}

impl Default for NetworkFlows {
    fn default() -> Self {
        Self {
            home_network_mac: None,
            blacklisted_macs: Vec::new(),
            monitored_interfaces: vec!["eth0".to_string()],
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
            cpu_temp_threshold: None,
            interface_unplugged: false,
        }
    }
}

impl Config {
    /// Reads, expands and validates the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Self::from_json_str_with(raw, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_json_str`] with a custom environment lookup.
    pub fn from_json_str_with(
        raw: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let document: Value = serde_json::from_str(raw)?;
        let config: Config = serde_json::from_value(expand_env(document, &lookup))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, entry, _) in self.plugin_entries() {
            for dependency in &entry.dependencies {
                dependency
                    .parse::<DependencyRef>()
                    .map_err(|source| ConfigError::Dependency {
                        plugin: name.to_string(),
                        source,
                    })?;
            }
        }
        self.home_address()?;
        self.blacklisted_addresses()?;
        Ok(())
    }

    pub fn home_address(&self) -> Result<Option<HwAddress>, InvalidHwAddress> {
        match self.network_flows.home_network_mac.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.parse().map(Some),
            _ => Ok(None),
        }
    }

    pub fn blacklisted_addresses(&self) -> Result<Vec<HwAddress>, InvalidHwAddress> {
        self.network_flows
            .blacklisted_macs
            .iter()
            .map(|raw| raw.parse())
            .collect()
    }

    /// Every plugin entry in both sections, default section first.
    pub fn plugin_entries(&self) -> impl Iterator<Item = (&str, &PluginConfig, PluginSection)> {
        let defaults = self
            .default_plugins
            .iter()
            .map(|(name, entry)| (name.as_str(), entry, PluginSection::Default));
        let optionals = self
            .optional_plugins
            .iter()
            .map(|(name, entry)| (name.as_str(), entry, PluginSection::Optional));
        defaults.chain(optionals)
    }

    /// Case-insensitive lookup of a plugin entry.
    pub fn plugin(&self, name: &str) -> Option<(&PluginConfig, PluginSection)> {
        self.plugin_entries()
            .find(|(key, _, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, entry, section)| (entry, section))
    }

    /// Default plugins are on unless switched off, optional ones are off
    /// unless switched on. Plugins with no entry at all stay off.
    pub fn is_plugin_enabled(&self, name: &str) -> bool {
        match self.plugin(name) {
            Some((entry, PluginSection::Default)) => entry.enabled.unwrap_or(true),
            Some((entry, PluginSection::Optional)) => entry.enabled.unwrap_or(false),
            None => false,
        }
    }

    /// The free-form `plugin_config` object of a plugin, `Null` if absent.
    pub fn plugin_settings(&self, name: &str) -> Value {
        self.plugin(name)
            .map(|(entry, _)| entry.plugin_config.clone())
            .unwrap_or(Value::Null)
    }

    pub fn dependencies(&self, name: &str) -> Vec<String> {
        self.plugin(name)
            .map(|(entry, _)| entry.dependencies.clone())
            .unwrap_or_default()
    }
}

fn expand_env(value: Value, lookup: &impl Fn(&str) -> Option<String>) -> Value {
    match value {
        Value::String(s) => match s.strip_prefix(ENV_PREFIX) {
            Some(var) => Value::String(lookup(var).unwrap_or_default()),
            None => Value::String(s),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(|v| expand_env(v, lookup)).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, expand_env(v, lookup)))
                .collect(),
        ),
        other => other,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
