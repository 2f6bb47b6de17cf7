use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use netfang_common::alert::{Alert, AlertId, NewAlert};
use netfang_common::network::device::{Device, DeviceId, DeviceReport, PluginLog};
use netfang_common::network::identity::{NetworkId, NetworkIdentity};
use netfang_common::network::mac::HwAddress;
use netfang_common::vendors::VendorRepository;
use serde::{Deserialize, Serialize};

use super::{NetworkStore, StoreError};

/// Everything a store holds; also the on-disk snapshot format.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct StoreData {
    networks: BTreeMap<HwAddress, NetworkIdentity>,
    #[serde(default)]
    devices: Vec<Device>,
    alerts: Vec<Alert>,
    #[serde(default)]
    plugin_logs: Vec<PluginLog>,
    next_network_id: u64,
    #[serde(default)]
    next_device_id: u64,
    next_alert_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
    vendors: Option<Box<dyn VendorRepository>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the vendor of every newly seen network through `vendors`.
    pub fn with_vendors(mut self, vendors: Box<dyn VendorRepository>) -> Self {
        self.vendors = Some(vendors);
        self
    }

    pub(crate) fn from_data(data: StoreData) -> Self {
        Self {
            data: Mutex::new(data),
            vendors: None,
        }
    }

    pub(crate) fn set_vendors(&mut self, vendors: Box<dyn VendorRepository>) {
        self.vendors = Some(vendors);
    }

    /// Applies `mutate` and hands the resulting data to `after` while still
    /// holding the lock, so callers observe mutations in order.
    pub(crate) fn mutate_then<T, E>(
        &self,
        mutate: impl FnOnce(&mut StoreData, Option<&dyn VendorRepository>) -> Result<T, E>,
        after: impl FnOnce(&StoreData) -> Result<(), E>,
    ) -> Result<T, E> {
        let mut data = self.lock();
        let value = mutate(&mut *data, self.vendors.as_deref())?;
        after(&*data)?;
        Ok(value)
    }

    fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut StoreData, Option<&dyn VendorRepository>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.mutate_then(mutate, |_| Ok(()))
    }

    fn lock(&self) -> MutexGuard<'_, StoreData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StoreData {
    pub(crate) fn upsert_network(
        &mut self,
        hw_address: &HwAddress,
        name: &str,
        blacklisted: bool,
        home: bool,
        vendors: Option<&dyn VendorRepository>,
    ) -> NetworkIdentity {
        let now = Utc::now();
        if let Some(existing) = self.networks.get_mut(hw_address) {
            existing.name = name.to_string();
            existing.blacklisted = blacklisted;
            existing.home = home;
            existing.last_seen = now;
            return existing.clone();
        }

        self.next_network_id += 1;
        let identity = NetworkIdentity {
            id: NetworkId(self.next_network_id),
            hw_address: hw_address.clone(),
            name: name.to_string(),
            blacklisted,
            home,
            vendor: vendors.and_then(|v| v.get_vendor(hw_address)),
            first_seen: now,
            last_seen: now,
        };
        self.networks.insert(hw_address.clone(), identity.clone());
        identity
    }

    pub(crate) fn upsert_device(
        &mut self,
        mut report: DeviceReport,
        vendors: Option<&dyn VendorRepository>,
    ) -> Result<Device, StoreError> {
        if !self.networks.values().any(|n| n.id == report.network_id) {
            return Err(StoreError::NetworkNotFound(report.network_id));
        }
        let now = Utc::now();
        if report.vendor.is_none() {
            report.vendor = report
                .hw_address
                .as_ref()
                .and_then(|hw| vendors.and_then(|v| v.get_vendor(hw)));
        }

        if let Some(existing) = self.devices.iter_mut().find(|d| d.matches(&report)) {
            existing.merge(report, now);
            return Ok(existing.clone());
        }

        self.next_device_id += 1;
        let device = Device {
            id: DeviceId(self.next_device_id),
            network_id: report.network_id,
            ip: report.ip,
            hw_address: report.hw_address,
            hostname: report.hostname,
            vendor: report.vendor,
            services: report.services,
            first_seen: now,
            last_seen: now,
        };
        self.devices.push(device.clone());
        Ok(device)
    }

    pub(crate) fn record_alert(&mut self, alert: NewAlert) -> AlertId {
        self.next_alert_id += 1;
        let id = AlertId(self.next_alert_id);
        self.alerts.push(Alert::from_new(id, alert, Utc::now()));
        id
    }

    pub(crate) fn resolve_alert(&mut self, id: AlertId) -> Result<Alert, StoreError> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::AlertNotFound(id))?;

        if !alert.resolved {
            alert.resolved = true;
            alert.resolved_at = Some(Utc::now());
        }
        Ok(alert.clone())
    }

    pub(crate) fn record_plugin_log(&mut self, plugin: &str, network_id: Option<NetworkId>, event: &str) {
        self.plugin_logs.push(PluginLog {
            plugin: plugin.to_string(),
            event: event.to_string(),
            network_id,
            timestamp: Utc::now(),
        });
    }
}

impl NetworkStore for MemoryStore {
    fn find_network(&self, hw_address: &HwAddress) -> Result<Option<NetworkIdentity>, StoreError> {
        Ok(self.lock().networks.get(hw_address).cloned())
    }

    fn upsert_network(
        &self,
        hw_address: &HwAddress,
        name: &str,
        blacklisted: bool,
        home: bool,
    ) -> Result<NetworkIdentity, StoreError> {
        self.mutate(|data, vendors| Ok(data.upsert_network(hw_address, name, blacklisted, home, vendors)))
    }

    fn record_alert(&self, alert: NewAlert) -> Result<AlertId, StoreError> {
        self.mutate(|data, _| Ok(data.record_alert(alert)))
    }

    fn resolve_alert(&self, id: AlertId) -> Result<Alert, StoreError> {
        self.mutate(|data, _| data.resolve_alert(id))
    }

    fn upsert_device(&self, report: DeviceReport) -> Result<Device, StoreError> {
        self.mutate(|data, vendors| data.upsert_device(report, vendors))
    }

    fn record_plugin_log(
        &self,
        plugin: &str,
        network_id: Option<NetworkId>,
        event: &str,
    ) -> Result<(), StoreError> {
        self.mutate(|data, _| {
            data.record_plugin_log(plugin, network_id, event);
            Ok(())
        })
    }

    fn networks(&self) -> Result<Vec<NetworkIdentity>, StoreError> {
        Ok(self.lock().networks.values().cloned().collect())
    }

    fn devices(&self, network_id: NetworkId) -> Result<Vec<Device>, StoreError> {
        Ok(self
            .lock()
            .devices
            .iter()
            .filter(|d| d.network_id == network_id)
            .cloned()
            .collect())
    }

    fn alerts(&self) -> Result<Vec<Alert>, StoreError> {
        Ok(self.lock().alerts.clone())
    }

    fn plugin_logs(&self) -> Result<Vec<PluginLog>, StoreError> {
        Ok(self.lock().plugin_logs.clone())
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
