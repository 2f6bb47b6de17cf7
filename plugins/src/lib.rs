//! # Netfang Plugins
//!
//! The collaborators shipped with netfang. Each one reads its settings from
//! the `plugin_config` object of its configuration entry.

use std::sync::Arc;

use anyhow::Context;
use netfang_common::config::Config;
use netfang_core::Plugin;
use netfang_core::store::NetworkStore;
use serde::de::DeserializeOwned;

pub mod arpscan;
pub mod debug;
pub mod macchanger;
pub mod results;
pub mod rustscan;
pub mod worker;

pub use arpscan::ArpScan;
pub use macchanger::MacChanger;
pub use rustscan::RustScan;

/// Every built-in plugin, in registration order. Scanners record what they
/// find in `store`.
pub fn builtin_plugins(config: &Config, store: Arc<dyn NetworkStore>) -> anyhow::Result<Vec<Arc<dyn Plugin>>> {
    let plugins: Vec<Arc<dyn Plugin>> = vec![
        Arc::new(MacChanger::new(settings(config, macchanger::NAME)?)),
        Arc::new(ArpScan::new(settings(config, arpscan::NAME)?, store.clone())),
        Arc::new(RustScan::new(settings(config, rustscan::NAME)?, store)),
        Arc::new(debug::DebugLogger),
    ];
    Ok(plugins)
}

fn settings<T: DeserializeOwned + Default>(config: &Config, name: &str) -> anyhow::Result<T> {
    let raw = config.plugin_settings(name);
    if raw.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(raw).with_context(|| format!("invalid plugin_config for {name}"))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
