//! Hands scan findings to the store, linked to the network being scanned.

use std::sync::Arc;

use netfang_common::network::device::DeviceReport;
use netfang_common::network::identity::NetworkId;
use netfang_core::store::NetworkStore;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ScanResults {
    plugin: &'static str,
    store: Arc<dyn NetworkStore>,
}

impl ScanResults {
    pub fn new(plugin: &'static str, store: Arc<dyn NetworkStore>) -> Self {
        Self { plugin, store }
    }

    /// Stores every report against `network_id` and logs `summary` for the
    /// plugin. Without a network (manual scans) only the log line is kept.
    /// Returns how many devices were stored.
    pub fn record(
        &self,
        network_id: Option<NetworkId>,
        reports: impl IntoIterator<Item = DeviceReport>,
        summary: &str,
    ) -> usize {
        let mut stored = 0;
        if let Some(network_id) = network_id {
            for mut report in reports {
                report.network_id = network_id;
                match self.store.upsert_device(report) {
                    Ok(device) => {
                        debug!(plugin = self.plugin, device = %device.id, ip = %device.ip, "device stored");
                        stored += 1;
                    }
                    Err(e) => warn!(plugin = self.plugin, "failed to store device: {}", e),
                }
            }
        }

        if let Err(e) = self.store.record_plugin_log(self.plugin, network_id, summary) {
            warn!(plugin = self.plugin, "failed to record plugin log: {}", e);
        }
        stored
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
