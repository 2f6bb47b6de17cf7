use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use netfang_common::alert::{Alert, AlertId, NewAlert};
use netfang_common::network::device::{Device, DeviceReport, PluginLog};
use netfang_common::network::identity::{NetworkId, NetworkIdentity};
use netfang_common::network::mac::HwAddress;
use netfang_common::state::ConnectionState;
use netfang_core::plugin::{HookResult, Plugin, PluginError, StateContext};
use netfang_core::store::{MemoryStore, NetworkStore, StoreError};
use netfang_core::{ConnectionStateMachine, MachineOptions, PluginRegistry, ScanTicket};

pub const HOME: &str = "AA:BB:CC:11:22:33";
pub const UNKNOWN: &str = "00:11:22:33:44:55";
pub const BLACKLISTED: &str = "DE:AD:BE:EF:CA:FE";

/// Shared log of `Plugin:callback` entries across every recording plugin.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

pub fn count(journal: &Journal, entry: &str) -> usize {
    journal.lock().unwrap().iter().filter(|e| *e == entry).count()
}

/*************************************************************
                      Recording plugin
**************************************************************/

pub struct RecordingPlugin {
    name: String,
    scan_capable: bool,
    fail_callbacks: bool,
    journal: Journal,
    tickets: Mutex<Vec<ScanTicket>>,
}

impl RecordingPlugin {
    pub fn new(name: &str, journal: &Journal) -> Arc<Self> {
        Self::build(name, false, false, journal)
    }

    pub fn scanner(name: &str, journal: &Journal) -> Arc<Self> {
        Self::build(name, true, false, journal)
    }

    /// Every lifecycle callback returns an error after recording.
    pub fn failing(name: &str, journal: &Journal) -> Arc<Self> {
        Self::build(name, false, true, journal)
    }

    fn build(name: &str, scan_capable: bool, fail_callbacks: bool, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            scan_capable,
            fail_callbacks,
            journal: journal.clone(),
            tickets: Mutex::new(Vec::new()),
        })
    }

    pub fn tickets(&self) -> Vec<ScanTicket> {
        self.tickets.lock().unwrap().clone()
    }

    fn record(&self, callback: &str) -> HookResult {
        self.journal.lock().unwrap().push(format!("{}:{}", self.name, callback));
        if self.fail_callbacks {
            return Err(PluginError::Failed(format!("{} refuses {}", self.name, callback)));
        }
        Ok(())
    }
}

impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_scan_capable(&self) -> bool {
        self.scan_capable
    }

    fn on_enable(&self) -> HookResult {
        Ok(())
    }

    fn on_disable(&self) -> HookResult {
        Ok(())
    }

    fn on_waiting_for_network(&self, _ctx: &StateContext) -> HookResult {
        self.record("waiting_for_network")
    }

    fn on_connecting(&self, _ctx: &StateContext) -> HookResult {
        self.record("connecting")
    }

    fn on_connected_home(&self, _ctx: &StateContext) -> HookResult {
        self.record("connected_home")
    }

    fn on_connected_new(&self, _ctx: &StateContext) -> HookResult {
        self.record("connected_new")
    }

    fn on_connected_known(&self, _ctx: &StateContext) -> HookResult {
        self.record("connected_known")
    }

    fn on_connected_blacklisted(&self, _ctx: &StateContext) -> HookResult {
        self.record("connected_blacklisted")
    }

    fn on_scanning_in_progress(&self, _ctx: &StateContext) -> HookResult {
        self.record("scanning_in_progress")
    }

    fn on_scan_completed(&self, _ctx: &StateContext) -> HookResult {
        self.record("scan_completed")
    }

    fn on_reconnecting(&self, _ctx: &StateContext) -> HookResult {
        self.record("reconnecting")
    }

    fn on_alerting(&self, _ctx: &StateContext) -> HookResult {
        self.record("alerting")
    }

    fn on_disconnected(&self, _ctx: &StateContext) -> HookResult {
        self.record("disconnected")
    }

    fn on_alert_resolved(&self, _alert: &Alert) -> HookResult {
        self.record("alert_resolved")
    }

    fn start_scan(&self, ticket: ScanTicket) -> HookResult {
        self.journal.lock().unwrap().push(format!("{}:start_scan", self.name));
        self.tickets.lock().unwrap().push(ticket);
        Ok(())
    }
}

/*************************************************************
                        Failing store
**************************************************************/

/// Memory store that can be switched to fail every call.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    down: AtomicBool,
}

impl FailingStore {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

impl NetworkStore for FailingStore {
    fn find_network(&self, hw_address: &HwAddress) -> Result<Option<NetworkIdentity>, StoreError> {
        self.check()?;
        self.inner.find_network(hw_address)
    }

    fn upsert_network(
        &self,
        hw_address: &HwAddress,
        name: &str,
        blacklisted: bool,
        home: bool,
    ) -> Result<NetworkIdentity, StoreError> {
        self.check()?;
        self.inner.upsert_network(hw_address, name, blacklisted, home)
    }

    fn record_alert(&self, alert: NewAlert) -> Result<AlertId, StoreError> {
        self.check()?;
        self.inner.record_alert(alert)
    }

    fn resolve_alert(&self, id: AlertId) -> Result<Alert, StoreError> {
        self.check()?;
        self.inner.resolve_alert(id)
    }

    fn upsert_device(&self, report: DeviceReport) -> Result<Device, StoreError> {
        self.check()?;
        self.inner.upsert_device(report)
    }

    fn record_plugin_log(
        &self,
        plugin: &str,
        network_id: Option<NetworkId>,
        event: &str,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.inner.record_plugin_log(plugin, network_id, event)
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

/*************************************************************
                          Fixtures
**************************************************************/

pub fn options() -> MachineOptions {
    MachineOptions {
        home_network: Some(HOME.parse().unwrap()),
        blacklisted: vec![BLACKLISTED.parse().unwrap()],
        monitored_interfaces: vec!["eth0".to_string()],
    }
}

pub fn registry_with(plugins: &[Arc<RecordingPlugin>]) -> Arc<PluginRegistry> {
    let registry = Arc::new(PluginRegistry::new());
    for plugin in plugins {
        registry.register(plugin.clone()).unwrap();
        assert!(registry.enable(plugin.name()).unwrap());
    }
    registry
}

pub fn machine_with(plugins: &[Arc<RecordingPlugin>]) -> Arc<ConnectionStateMachine> {
    ConnectionStateMachine::new(registry_with(plugins), Arc::new(MemoryStore::new()), options())
}

pub fn wait_for(machine: &ConnectionStateMachine, state: ConnectionState, timeout: Duration) -> bool {
    let started = Instant::now();
    while started.elapsed() < timeout {
        if machine.state() == state {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    machine.state() == state
}
