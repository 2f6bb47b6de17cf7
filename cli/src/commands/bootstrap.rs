//! Builds the orchestrator from the configuration.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use netfang_common::config::Config;
use netfang_core::store::{JsonFileStore, MemoryStore, NetworkStore};
use netfang_core::vendors::MacOuiRepo;
use netfang_core::{ConnectionStateMachine, MachineOptions, PluginRegistry};
use tracing::{debug, warn};

/// A missing file at `path` falls back to the defaults.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        warn!("{} not found, running with the default configuration", path.display());
        return Ok(Config::default());
    }
    Config::load(path).with_context(|| format!("failed to load {}", path.display()))
}

pub fn open_store(config: &Config) -> anyhow::Result<Arc<dyn NetworkStore>> {
    let store: Arc<dyn NetworkStore> = match &config.database_path {
        Some(path) => {
            debug!("using store at {}", path.display());
            let store = JsonFileStore::open(path)
                .with_context(|| format!("failed to open store {}", path.display()))?;
            Arc::new(store.with_vendors(Box::new(MacOuiRepo)))
        }
        None => Arc::new(MemoryStore::new().with_vendors(Box::new(MacOuiRepo))),
    };
    Ok(store)
}

pub fn build(config: &Config) -> anyhow::Result<Arc<ConnectionStateMachine>> {
    let store = open_store(config)?;
    let registry = Arc::new(PluginRegistry::new());
    for plugin in netfang_plugins::builtin_plugins(config, store.clone())? {
        registry.register(plugin)?;
    }
    registry
        .apply_config(config)
        .context("failed to configure plugins")?;

    let options = MachineOptions::from_config(config)?;
    Ok(ConnectionStateMachine::new(registry, store, options))
}
