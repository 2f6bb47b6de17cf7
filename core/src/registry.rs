//! # Plugin Registry
//!
//! Owns every loaded plugin in registration order and their enabled flags.
//!
//! Enabling runs the plugin's declared dependencies first, then its enable
//! hook, and only then marks it enabled. Disabling marks it disabled first,
//! then runs the disable hook. Either way a plugin only appears in a
//! snapshot while it is fully enabled.
//!
//! No lock is held while a hook runs, so hooks may call back into the
//! registry.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

use netfang_common::config::{Config, ConfigError};
use netfang_common::dependency::DependencyRef;
use netfang_common::state::ConnectionState;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::plugin::{self, HookResult, Plugin, StateContext};

/// A plugin together with its registry key.
#[derive(Clone)]
pub struct PluginHandle {
    pub name: String,
    pub plugin: Arc<dyn Plugin>,
}

/// Read-only view of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub name: String,
    pub enabled: bool,
    pub scan_capable: bool,
    pub dependencies: Vec<String>,
}

struct PluginSlot {
    key: String,
    plugin: Arc<dyn Plugin>,
    enabled: bool,
    dependencies: Vec<String>,
}

#[derive(Default)]
pub struct PluginRegistry {
    slots: RwLock<Vec<PluginSlot>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a disabled plugin. Names are unique ignoring case.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<()> {
        self.register_with_dependencies(plugin, Vec::new())
    }

    pub fn register_with_dependencies(
        &self,
        plugin: Arc<dyn Plugin>,
        dependencies: Vec<String>,
    ) -> Result<()> {
        let key = plugin.name().to_ascii_lowercase();
        let mut slots = self.write();
        if slots.iter().any(|slot| slot.key == key) {
            return Err(ConfigError::DuplicatePlugin(plugin.name().to_string()).into());
        }
        debug!(plugin = %plugin.name(), "registered plugin");
        slots.push(PluginSlot {
            key,
            plugin,
            enabled: false,
            dependencies,
        });
        Ok(())
    }

    /// Applies the configuration to the registered plugins: dependencies are
    /// taken from the file, `on_setup` runs for every plugin the file
    /// enables, then each plugin is enabled or disabled accordingly.
    pub fn apply_config(&self, config: &Config) -> Result<()> {
        for (name, _, _) in config.plugin_entries() {
            if self.find(name).is_none() {
                return Err(ConfigError::UnknownPlugin(name.to_string()).into());
            }
        }

        let names: Vec<String> = self.read().iter().map(|s| s.plugin.name().to_string()).collect();
        for name in &names {
            if config.plugin(name).is_some() {
                self.set_dependencies(name, config.dependencies(name))?;
            }
        }

        for name in &names {
            if !config.is_plugin_enabled(name) {
                continue;
            }
            if let Some(handle) = self.find(name) {
                if let Err(e) = handle.plugin.on_setup() {
                    warn!(plugin = %name, "setup failed: {}", e);
                }
            }
        }

        for name in &names {
            if config.is_plugin_enabled(name) {
                self.enable(name)?;
            } else if self.is_enabled(name) == Some(true) {
                self.disable(name)?;
            }
        }
        Ok(())
    }

    pub fn set_dependencies(&self, name: &str, dependencies: Vec<String>) -> Result<()> {
        let key = name.to_ascii_lowercase();
        let mut slots = self.write();
        let slot = slots
            .iter_mut()
            .find(|slot| slot.key == key)
            .ok_or_else(|| Error::PluginNotFound(name.to_string()))?;
        slot.dependencies = dependencies;
        Ok(())
    }

    /// Resolves dependencies, runs the enable hook and marks the plugin
    /// enabled. Idempotent in effect; the hook and dependencies run again on
    /// every call.
    ///
    /// Returns whether the plugin ended up enabled: a failing enable hook is
    /// logged and leaves the plugin disabled.
    pub fn enable(&self, name: &str) -> Result<bool> {
        let (handle, dependencies) = {
            let slots = self.read();
            let slot = find_slot(&slots, name).ok_or_else(|| Error::PluginNotFound(name.to_string()))?;
            (
                PluginHandle {
                    name: slot.plugin.name().to_string(),
                    plugin: slot.plugin.clone(),
                },
                slot.dependencies.clone(),
            )
        };

        for dependency in &dependencies {
            self.satisfy_dependency(&handle.name, dependency);
        }

        if let Err(e) = handle.plugin.on_enable() {
            warn!(plugin = %handle.name, "enable hook failed, plugin stays disabled: {}", e);
            return Ok(false);
        }

        self.set_enabled(name, true);
        info!(plugin = %handle.name, "plugin enabled");
        Ok(true)
    }

    /// Marks the plugin disabled, then runs its disable hook.
    pub fn disable(&self, name: &str) -> Result<()> {
        let handle = self.find(name).ok_or_else(|| Error::PluginNotFound(name.to_string()))?;
        self.set_enabled(name, false);

        if let Err(e) = handle.plugin.on_disable() {
            warn!(plugin = %handle.name, "disable hook failed: {}", e);
        }
        info!(plugin = %handle.name, "plugin disabled");
        Ok(())
    }

    /// Enabled scan-capable plugins at call time, in registration order.
    pub fn scan_capable_enabled(&self) -> Vec<PluginHandle> {
        self.read()
            .iter()
            .filter(|slot| slot.enabled && slot.plugin.is_scan_capable())
            .map(to_handle)
            .collect()
    }

    /// Enabled plugins at call time, in registration order.
    pub fn enabled(&self) -> Vec<PluginHandle> {
        self.read().iter().filter(|slot| slot.enabled).map(to_handle).collect()
    }

    pub fn find(&self, name: &str) -> Option<PluginHandle> {
        find_slot(&self.read(), name).map(to_handle)
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        find_slot(&self.read(), name).map(|slot| slot.enabled)
    }

    pub fn descriptors(&self) -> Vec<PluginDescriptor> {
        self.read()
            .iter()
            .map(|slot| PluginDescriptor {
                name: slot.plugin.name().to_string(),
                enabled: slot.enabled,
                scan_capable: slot.plugin.is_scan_capable(),
                dependencies: slot.dependencies.clone(),
            })
            .collect()
    }

    /// Delivers the lifecycle callback for `state` to every enabled plugin in
    /// registration order. A failing or panicking plugin is logged and does
    /// not stop delivery to the rest.
    pub fn dispatch(&self, state: ConnectionState, ctx: &StateContext) {
        for handle in self.enabled() {
            guarded(&handle.name, state.callback_name(), || {
                plugin::invoke_state_hook(handle.plugin.as_ref(), state, ctx)
            });
        }
    }

    /// Routes `args[1..]` to the plugin named by `args[0]`.
    pub fn perform_action(&self, args: &[String]) -> Result<()> {
        let (target, rest) = args
            .split_first()
            .ok_or_else(|| Error::PluginNotFound(String::new()))?;
        let handle = self.find(target).ok_or_else(|| Error::PluginNotFound(target.clone()))?;

        guarded(&handle.name, "perform_action", || handle.plugin.perform_action(rest));
        Ok(())
    }

    fn satisfy_dependency(&self, owner: &str, raw: &str) {
        let dependency: DependencyRef = match raw.parse() {
            Ok(dependency) => dependency,
            Err(e) => {
                warn!(plugin = %owner, "skipping dependency: {}", e);
                return;
            }
        };

        let Some(target) = self.find(&dependency.plugin) else {
            warn!(plugin = %owner, "skipping dependency {}: plugin not found", dependency);
            return;
        };

        debug!(plugin = %owner, "running dependency {}", dependency);
        if let Err(e) = target.plugin.run_setup_action(&dependency.action) {
            warn!(plugin = %owner, "dependency {} failed: {}", dependency, e);
        }
    }

    fn set_enabled(&self, name: &str, enabled: bool) {
        let key = name.to_ascii_lowercase();
        if let Some(slot) = self.write().iter_mut().find(|slot| slot.key == key) {
            slot.enabled = enabled;
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<PluginSlot>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<PluginSlot>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_slot<'a>(slots: &'a [PluginSlot], name: &str) -> Option<&'a PluginSlot> {
    slots.iter().find(|slot| slot.key.eq_ignore_ascii_case(name))
}

fn to_handle(slot: &PluginSlot) -> PluginHandle {
    PluginHandle {
        name: slot.plugin.name().to_string(),
        plugin: slot.plugin.clone(),
    }
}

/// Runs one plugin hook, containing both errors and panics.
pub(crate) fn guarded(plugin: &str, hook: &str, f: impl FnOnce() -> HookResult) {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(plugin = %plugin, hook = %hook, "plugin callback failed: {}", e),
        Err(_) => error!(plugin = %plugin, hook = %hook, "plugin callback panicked"),
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
