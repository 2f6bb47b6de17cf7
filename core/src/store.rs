//! # Store Port
//!
//! The persistent store of networks, the devices found on them, alerts and
//! plugin activity is an external collaborator.
//! The state machine only ever talks to it through [`NetworkStore`].
//!
//! Two adapters ship with the crate:
//! * [`MemoryStore`]: everything in memory, used by tests and one-shot runs.
//! * [`JsonFileStore`]: the memory store plus a JSON snapshot on disk.

use netfang_common::alert::{Alert, AlertId, NewAlert};
use netfang_common::network::device::{Device, DeviceReport, PluginLog};
use netfang_common::network::identity::{NetworkId, NetworkIdentity};
use netfang_common::network::mac::HwAddress;

mod json;
mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store persistence failed")]
    Io(#[from] std::io::Error),
    #[error("store snapshot is not valid JSON")]
    Serialization(#[from] serde_json::Error),
    #[error("alert {0} does not exist")]
    AlertNotFound(AlertId),
    #[error("network {0} does not exist")]
    NetworkNotFound(NetworkId),
}

pub trait NetworkStore: Send + Sync {
    fn find_network(&self, hw_address: &HwAddress) -> Result<Option<NetworkIdentity>, StoreError>;

    /// Inserts the network or refreshes name, flags and last-seen of an
    /// existing one. Returns the stored record.
    fn upsert_network(
        &self,
        hw_address: &HwAddress,
        name: &str,
        blacklisted: bool,
        home: bool,
    ) -> Result<NetworkIdentity, StoreError>;

    fn record_alert(&self, alert: NewAlert) -> Result<AlertId, StoreError>;

    fn resolve_alert(&self, id: AlertId) -> Result<Alert, StoreError>;

    /// Inserts or refreshes a host found on a known network. Fails with
    /// [`StoreError::NetworkNotFound`] if the network was never recorded.
    fn upsert_device(&self, report: DeviceReport) -> Result<Device, StoreError>;

    fn record_plugin_log(
        &self,
        plugin: &str,
        network_id: Option<NetworkId>,
        event: &str,
    ) -> Result<(), StoreError>;

    fn networks(&self) -> Result<Vec<NetworkIdentity>, StoreError>;

    fn devices(&self, network_id: NetworkId) -> Result<Vec<Device>, StoreError>;

    fn alerts(&self) -> Result<Vec<Alert>, StoreError>;

    fn plugin_logs(&self) -> Result<Vec<PluginLog>, StoreError>;
}
