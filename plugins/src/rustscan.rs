//! Port sweep with `rustscan`.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use netfang_common::network::device::DeviceReport;
use netfang_common::network::identity::NetworkId;
use netfang_core::store::NetworkStore;
use netfang_core::{HookResult, Plugin, PluginError, ScanTicket};
use serde::Deserialize;
use tracing::{info, warn};

use crate::results::ScanResults;
use crate::worker::{self, ScanCommand};

pub const NAME: &str = "RustScan";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RustScanSettings {
    pub command: String,
    /// Address or range handed to `-a`.
    pub target: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RustScanSettings {
    fn default() -> Self {
        Self {
            command: "rustscan".to_string(),
            target: None,
            timeout_secs: 600,
        }
    }
}

pub type OpenPorts = BTreeMap<IpAddr, Vec<u16>>;

pub struct RustScan {
    settings: RustScanSettings,
    open_ports: Arc<Mutex<OpenPorts>>,
    results: ScanResults,
}

impl RustScan {
    pub fn new(settings: RustScanSettings, store: Arc<dyn NetworkStore>) -> Self {
        Self {
            settings,
            open_ports: Arc::new(Mutex::new(OpenPorts::new())),
            results: ScanResults::new(NAME, store),
        }
    }

    pub fn open_ports(&self) -> OpenPorts {
        self.open_ports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn launch(&self, target: &str, ticket: Option<ScanTicket>) -> HookResult {
        let command = ScanCommand::new(
            "rustscan",
            self.settings.command.clone(),
            Duration::from_secs(self.settings.timeout_secs),
        )
        .arg("-a")
        .arg(target)
        .arg("--greppable");

        let open_ports = self.open_ports.clone();
        let results = self.results.clone();
        let network_id = ticket.as_ref().and_then(|t| t.context().network_id);
        worker::spawn(command, ticket, move |outcome| match outcome {
            Ok(output) => {
                let found = parse_greppable(&output.lines);
                info!(plugin = NAME, "port sweep found {} hosts with open ports", found.len());
                results.record(
                    network_id,
                    reports(&found),
                    &format!("found {} hosts with open ports", found.len()),
                );
                *open_ports.lock().unwrap_or_else(PoisonError::into_inner) = found;
            }
            Err(e) => {
                warn!(plugin = NAME, "port sweep failed: {:#}", e);
                results.record(network_id, Vec::<DeviceReport>::new(), &format!("scan failed: {e:#}"));
            }
        })?;
        Ok(())
    }
}

/// One report per host, carrying its open ports.
pub fn reports(found: &OpenPorts) -> Vec<DeviceReport> {
    found
        .iter()
        .map(|(ip, ports)| DeviceReport {
            services: ports.clone(),
            ..DeviceReport::new(NetworkId(0), *ip)
        })
        .collect()
}

/// Greppable lines look like `192.168.1.1 -> [22,80,443]`.
pub fn parse_greppable(lines: &[String]) -> OpenPorts {
    let mut found = OpenPorts::new();
    for line in lines {
        let Some((host, ports)) = line.split_once("->") else {
            continue;
        };
        let Ok(ip) = host.trim().parse::<IpAddr>() else {
            continue;
        };
        let ports = ports
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .filter_map(|port| port.trim().parse::<u16>().ok());
        found.entry(ip).or_default().extend(ports);
    }
    found
}

impl Plugin for RustScan {
    fn name(&self) -> &str {
        NAME
    }

    fn is_scan_capable(&self) -> bool {
        true
    }

    fn on_enable(&self) -> HookResult {
        if self.settings.target.is_none() {
            warn!(plugin = NAME, "no target configured, scans will be skipped");
        }
        Ok(())
    }

    fn on_disable(&self) -> HookResult {
        Ok(())
    }

    fn start_scan(&self, ticket: ScanTicket) -> HookResult {
        match self.settings.target.clone() {
            Some(target) => self.launch(&target, Some(ticket)),
            None => {
                ticket.complete();
                Ok(())
            }
        }
    }

    /// `scan TARGET` sweeps an explicit target.
    fn perform_action(&self, args: &[String]) -> HookResult {
        match args {
            [action, target] if action == "scan" => self.launch(target, None),
            _ => Err(PluginError::Failed(format!("usage: {NAME} scan TARGET"))),
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
