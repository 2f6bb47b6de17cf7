use std::fs;
use std::path::{Path, PathBuf};

use netfang_common::alert::{Alert, AlertId, NewAlert};
use netfang_common::network::device::{Device, DeviceReport, PluginLog};
use netfang_common::network::identity::{NetworkId, NetworkIdentity};
use netfang_common::network::mac::HwAddress;
use netfang_common::vendors::VendorRepository;
use tracing::debug;

use super::memory::{MemoryStore, StoreData};
use super::{NetworkStore, StoreError};

/// A [`MemoryStore`] whose contents survive restarts as a JSON file.
///
/// The snapshot is rewritten through a temporary file and a rename after
/// every mutation, under the same lock as the mutation itself. Writers never
/// share the temporary file and snapshots reach the disk in mutation order.
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data: StoreData = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(e.into()),
        };
        debug!("Opened store at {}", path.display());
        Ok(Self {
            path,
            inner: MemoryStore::from_data(data),
        })
    }

    pub fn with_vendors(mut self, vendors: Box<dyn VendorRepository>) -> Self {
        self.inner.set_vendors(vendors);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `mutate` on the data and writes the result before the lock is
    /// released.
    fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut StoreData, Option<&dyn VendorRepository>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.inner.mutate_then(mutate, |data| self.persist(data))
    }

    fn persist(&self, data: &StoreData) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl NetworkStore for JsonFileStore {
    fn find_network(&self, hw_address: &HwAddress) -> Result<Option<NetworkIdentity>, StoreError> {
        self.inner.find_network(hw_address)
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
        self.inner.networks()
    }

    fn devices(&self, network_id: NetworkId) -> Result<Vec<Device>, StoreError> {
        self.inner.devices(network_id)
    }

    fn alerts(&self) -> Result<Vec<Alert>, StoreError> {
        self.inner.alerts()
    }

    fn plugin_logs(&self) -> Result<Vec<PluginLog>, StoreError> {
        self.inner.plugin_logs()
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
