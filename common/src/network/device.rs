use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::NetworkId;
use super::mac::HwAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What one scan learned about a host on a network.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    pub network_id: NetworkId,
    pub ip: IpAddr,
    pub hw_address: Option<HwAddress>,
    pub hostname: Option<String>,
    pub vendor: Option<String>,
    /// Open ports. Empty means the scan didn't look.
    pub services: Vec<u16>,
}

impl DeviceReport {
    pub fn new(network_id: NetworkId, ip: IpAddr) -> Self {
        Self {
            network_id,
            ip,
            hw_address: None,
            hostname: None,
            vendor: None,
            services: Vec::new(),
        }
    }
}

/// A host seen on one of the known networks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub network_id: NetworkId,
    pub ip: IpAddr,
    pub hw_address: Option<HwAddress>,
    pub hostname: Option<String>,
    pub vendor: Option<String>,
    pub services: Vec<u16>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Device {
    /// Whether `report` describes this same host. The hardware address wins
    /// when both sides know it, the IP address decides otherwise.
    pub fn matches(&self, report: &DeviceReport) -> bool {
        if self.network_id != report.network_id {
            return false;
        }
        match (&self.hw_address, &report.hw_address) {
            (Some(known), Some(reported)) => known == reported,
            _ => self.ip == report.ip,
        }
    }

    /// Folds a newer report in. Fields the report leaves empty keep their
    /// stored value.
    pub fn merge(&mut self, report: DeviceReport, seen: DateTime<Utc>) {
        self.ip = report.ip;
        if report.hw_address.is_some() {
            self.hw_address = report.hw_address;
        }
        if report.hostname.is_some() {
            self.hostname = report.hostname;
        }
        if report.vendor.is_some() {
            self.vendor = report.vendor;
        }
        if !report.services.is_empty() {
            self.services = report.services;
        }
        self.last_seen = seen;
    }
}

/// One line of a plugin's activity history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginLog {
    pub plugin: String,
    pub event: String,
    pub network_id: Option<NetworkId>,
    pub timestamp: DateTime<Utc>,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
