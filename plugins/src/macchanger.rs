//! Hardware address randomisation before a plugin touches a new network.
//!
//! Exposes the `randomize` setup action, meant to be referenced from other
//! plugins' dependency lists as `macchanger.randomize`.

use std::time::Duration;

use anyhow::bail;
use netfang_core::{HookResult, Plugin, PluginError};
use serde::Deserialize;
use tracing::info;

use crate::worker::{self, ScanCommand};

pub const NAME: &str = "MacChanger";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MacChangerSettings {
    pub command: String,
    pub interface: String,
    pub timeout_secs: u64,
}

impl Default for MacChangerSettings {
    fn default() -> Self {
        Self {
            command: "macchanger".to_string(),
            interface: "eth0".to_string(),
            timeout_secs: 30,
        }
    }
}

pub struct MacChanger {
    settings: MacChangerSettings,
}

impl MacChanger {
    pub fn new(settings: MacChangerSettings) -> Self {
        Self { settings }
    }

    fn randomize(&self) -> anyhow::Result<()> {
        let command = ScanCommand::new(
            "macchanger",
            self.settings.command.clone(),
            Duration::from_secs(self.settings.timeout_secs),
        )
        .arg("-r")
        .arg(self.settings.interface.clone());

        let output = worker::run(&command)?;
        if !output.succeeded() {
            bail!("{} exited unsuccessfully on {}", self.settings.command, self.settings.interface);
        }
        for line in output.lines.iter().filter(|line| line.starts_with("New MAC")) {
            info!(plugin = NAME, interface = %self.settings.interface, "{}", line.trim());
        }
        Ok(())
    }
}

impl Plugin for MacChanger {
    fn name(&self) -> &str {
        NAME
    }

    fn on_enable(&self) -> HookResult {
        Ok(())
    }

    fn on_disable(&self) -> HookResult {
        Ok(())
    }

    fn run_setup_action(&self, action: &str) -> HookResult {
        match action {
            "randomize" => Ok(self.randomize()?),
            "on_setup" => self.on_setup(),
            _ => Err(PluginError::UnknownAction {
                plugin: NAME.to_string(),
                action: action.to_string(),
            }),
        }
    }

    fn perform_action(&self, args: &[String]) -> HookResult {
        match args.first().map(String::as_str) {
            Some(action) => self.run_setup_action(action),
            None => self.run_setup_action("randomize"),
        }
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
