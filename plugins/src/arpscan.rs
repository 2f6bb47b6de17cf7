//! Neighbour discovery with `arp-scan`.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use netfang_common::network::device::DeviceReport;
use netfang_common::network::identity::NetworkId;
use netfang_common::network::mac::HwAddress;
use netfang_core::store::NetworkStore;
use netfang_core::{HookResult, Plugin, ScanTicket, StateContext};
use serde::Deserialize;
use tracing::{info, warn};

use crate::results::ScanResults;
use crate::worker::{self, ScanCommand, ScanOutput};

pub const NAME: &str = "ArpScan";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArpScanSettings {
    pub command: String,
    pub interface: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ArpScanSettings {
    fn default() -> Self {
        Self {
            command: "arp-scan".to_string(),
            interface: None,
            timeout_secs: 300,
        }
    }
}

/// One answer to the ARP sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbour {
    pub ip: Ipv4Addr,
    pub hw_address: HwAddress,
    pub vendor: Option<String>,
}

impl Neighbour {
    fn report(&self) -> DeviceReport {
        DeviceReport {
            hw_address: Some(self.hw_address.clone()),
            vendor: self.vendor.clone(),
            ..DeviceReport::new(NetworkId(0), IpAddr::V4(self.ip))
        }
    }
}

pub struct ArpScan {
    settings: ArpScanSettings,
    neighbours: Arc<Mutex<Vec<Neighbour>>>,
    results: ScanResults,
}

impl ArpScan {
    pub fn new(settings: ArpScanSettings, store: Arc<dyn NetworkStore>) -> Self {
        Self {
            settings,
            neighbours: Arc::new(Mutex::new(Vec::new())),
            results: ScanResults::new(NAME, store),
        }
    }

    /// Neighbours found by the last finished scan.
    pub fn neighbours(&self) -> Vec<Neighbour> {
        self.neighbours
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn command(&self, interface: Option<&str>) -> ScanCommand {
        let mut command = ScanCommand::new(
            "arpscan",
            self.settings.command.clone(),
            Duration::from_secs(self.settings.timeout_secs),
        )
        .arg("--localnet");
        if let Some(interface) = interface.or(self.settings.interface.as_deref()) {
            command = command.arg(format!("--interface={interface}"));
        }
        command
    }

    fn launch(&self, interface: Option<&str>, ticket: Option<ScanTicket>) -> HookResult {
        let neighbours = self.neighbours.clone();
        let results = self.results.clone();
        let network_id = ticket.as_ref().and_then(|t| t.context().network_id);
        worker::spawn(self.command(interface), ticket, move |outcome| match outcome {
            Ok(output) => store_results(&neighbours, &results, network_id, &output),
            Err(e) => {
                warn!(plugin = NAME, "arp scan failed: {:#}", e);
                results.record(network_id, Vec::<DeviceReport>::new(), &format!("scan failed: {e:#}"));
            }
        })?;
        Ok(())
    }
}

fn store_results(
    neighbours: &Mutex<Vec<Neighbour>>,
    results: &ScanResults,
    network_id: Option<NetworkId>,
    output: &ScanOutput,
) {
    if output.timed_out() {
        warn!(plugin = NAME, "arp scan cut short, keeping partial results");
    }
    let found = parse_output(&output.lines);
    info!(plugin = NAME, "arp scan found {} neighbours", found.len());
    results.record(
        network_id,
        found.iter().map(Neighbour::report),
        &format!("found {} neighbours", found.len()),
    );
    *neighbours.lock().unwrap_or_else(PoisonError::into_inner) = found;
}

/// Host lines look like `192.168.1.1\taa:bb:cc:dd:ee:ff\tVendor`; the
/// banner and summary lines don't parse and are skipped.
pub fn parse_output(lines: &[String]) -> Vec<Neighbour> {
    lines
        .iter()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let ip = fields.next()?.trim().parse().ok()?;
            let hw_address = fields.next()?.trim().parse().ok()?;
            let vendor = fields
                .next()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            Some(Neighbour { ip, hw_address, vendor })
        })
        .collect()
}

impl Plugin for ArpScan {
    fn name(&self) -> &str {
        NAME
    }

    fn is_scan_capable(&self) -> bool {
        true
    }

    fn on_enable(&self) -> HookResult {
        if !is_root::is_root() {
            warn!(plugin = NAME, "not running as root, arp-scan will most likely fail");
        }
        Ok(())
    }

    fn on_disable(&self) -> HookResult {
        Ok(())
    }

    fn start_scan(&self, ticket: ScanTicket) -> HookResult {
        let interface = ticket.context().interface.clone();
        self.launch(interface.as_deref(), Some(ticket))
    }

    /// `scan [INTERFACE]` starts a scan outside any session.
    fn perform_action(&self, args: &[String]) -> HookResult {
        match args.split_first() {
            Some((action, rest)) if action == "scan" => {
                self.launch(rest.first().map(String::as_str), None)
            }
            _ => Err(netfang_core::PluginError::Failed(format!(
                "unsupported action '{}'",
                args.join(" ")
            ))),
        }
    }

    fn on_scan_completed(&self, ctx: &StateContext) -> HookResult {
        if let Some(name) = &ctx.network_name {
            info!(plugin = NAME, network = %name, "{} neighbours on record", self.neighbours().len());
        }
        Ok(())
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
