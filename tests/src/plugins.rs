use std::sync::Arc;
use std::time::Duration;

use netfang_common::config::Config;
use netfang_common::state::ConnectionState;
use netfang_core::store::{MemoryStore, NetworkStore};
use netfang_core::{ConnectionStateMachine, MachineOptions, PluginRegistry};

use crate::support::*;

fn orchestrator(raw_config: &str) -> Arc<ConnectionStateMachine> {
    let config = Config::from_json_str(raw_config).unwrap();
    let store: Arc<dyn NetworkStore> = Arc::new(MemoryStore::new());
    let registry = Arc::new(PluginRegistry::new());
    for plugin in netfang_plugins::builtin_plugins(&config, store.clone()).unwrap() {
        registry.register(plugin).unwrap();
    }
    registry.apply_config(&config).unwrap();
    ConnectionStateMachine::new(registry, store, MachineOptions::from_config(&config).unwrap())
}

#[test]
fn configuration_decides_what_is_enabled() {
    let machine = orchestrator(
        r#"{
            "default_plugins": { "arpscan": {}, "rustscan": { "enabled": false } },
            "optional_plugins": { "debug": { "enabled": true }, "macchanger": {} }
        }"#,
    );

    let enabled: Vec<String> = machine
        .registry()
        .descriptors()
        .into_iter()
        .filter(|d| d.enabled)
        .map(|d| d.name)
        .collect();
    assert_eq!(enabled, vec!["ArpScan".to_string(), "Debug".to_string()]);
}

#[test]
fn home_network_from_configuration() {
    let machine = orchestrator(r#"{ "network_flows": { "home_network_mac": "aa:bb:cc:11:22:33" } }"#);
    assert_eq!(machine.handle_connection(HOME, "home").unwrap(), ConnectionState::ConnectedHome);
}

#[test]
fn debug_plugin_alone_never_holds_the_scan() {
    let machine = orchestrator(r#"{ "optional_plugins": { "debug": { "enabled": true } } }"#);
    assert_eq!(
        machine.handle_connection(UNKNOWN, "cafe").unwrap(),
        ConnectionState::ScanCompleted
    );
}

#[cfg(unix)]
#[test]
fn subprocess_scans_drive_the_barrier() {
    // `true` stands in for arp-scan and exits at once.
    let machine = orchestrator(
        r#"{ "default_plugins": { "arpscan": { "plugin_config": { "command": "true", "timeout_secs": 5 } } } }"#,
    );

    let state = machine.handle_connection(UNKNOWN, "cafe").unwrap();
    assert!(matches!(
        state,
        ConnectionState::ScanningInProgress | ConnectionState::ScanCompleted
    ));
    assert!(wait_for(&machine, ConnectionState::ScanCompleted, Duration::from_secs(10)));
}

#[cfg(unix)]
#[test]
fn missing_scanner_binary_still_completes() {
    let machine = orchestrator(
        r#"{ "default_plugins": { "arpscan": { "plugin_config": { "command": "no-such-arp-scan" } } } }"#,
    );

    machine.handle_connection(UNKNOWN, "cafe").unwrap();
    assert!(wait_for(&machine, ConnectionState::ScanCompleted, Duration::from_secs(10)));
}

#[cfg(unix)]
#[test]
fn neighbours_are_stored_against_the_scanned_network() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("fake-arp-scan");
    std::fs::write(&script, "#!/bin/sh\nprintf '192.168.1.7\\taa:bb:cc:dd:ee:01\\tAcme\\n'\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    let machine = orchestrator(&format!(
        r#"{{ "default_plugins": {{ "arpscan": {{ "plugin_config": {{ "command": "{}", "timeout_secs": 5 }} }} }} }}"#,
        script.display()
    ));

    machine.handle_connection(UNKNOWN, "cafe").unwrap();
    assert!(wait_for(&machine, ConnectionState::ScanCompleted, Duration::from_secs(10)));

    let network_id = machine.context().network_id.unwrap();
    let devices = machine.store().devices(network_id).unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].ip.to_string(), "192.168.1.7");
    assert_eq!(devices[0].vendor.as_deref(), Some("Acme"));

    let logs = machine.store().plugin_logs().unwrap();
    assert!(logs.iter().any(|log| log.plugin == "ArpScan" && log.network_id == Some(network_id)));
}

#[test]
fn unknown_plugin_in_configuration_is_fatal() {
    let config = Config::from_json_str(r#"{ "optional_plugins": { "pushover": {} } }"#).unwrap();
    let registry = PluginRegistry::new();
    for plugin in netfang_plugins::builtin_plugins(&config, Arc::new(MemoryStore::new())).unwrap() {
        registry.register(plugin).unwrap();
    }
    assert!(registry.apply_config(&config).is_err());
}
