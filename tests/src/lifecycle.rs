use std::sync::Arc;

use netfang_common::state::ConnectionState;
use netfang_core::{ConnectionStateMachine, Error};

use crate::support::*;

/*************************************************************
                    Classification paths
**************************************************************/

#[test]
fn home_network_connects_without_scanning() {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let machine = machine_with(&[arp.clone()]);

    let state = machine.handle_connection(HOME, "home").unwrap();

    assert_eq!(state, ConnectionState::ConnectedHome);
    assert!(machine.scan_session().is_none());
    assert!(arp.tickets().is_empty());
    assert_eq!(entries(&journal), vec!["ArpScan:connected_home"]);
}

#[test]
fn blacklisted_network_is_never_scanned() {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let machine = machine_with(&[arp.clone()]);

    machine.handle_connection(BLACKLISTED, "free wifi").unwrap();
    machine.handle_connection(BLACKLISTED, "free wifi").unwrap();

    assert_eq!(machine.state(), ConnectionState::ConnectedBlacklisted);
    assert_eq!(count(&journal, "ArpScan:scanning_in_progress"), 0);
    assert_eq!(count(&journal, "ArpScan:connected_blacklisted"), 1);
}

#[test]
fn blacklist_flag_in_the_store_wins_over_home() {
    let journal = Journal::default();
    let machine = machine_with(&[RecordingPlugin::new("Debug", &journal)]);
    machine
        .store()
        .upsert_network(&HOME.parse().unwrap(), "home", true, false)
        .unwrap();

    assert_eq!(
        machine.handle_connection(HOME, "home").unwrap(),
        ConnectionState::ConnectedBlacklisted
    );
}

#[test]
fn unknown_network_is_announced_then_scanned() {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let logger = RecordingPlugin::new("Debug", &journal);
    let machine = machine_with(&[arp.clone(), logger]);

    machine.handle_connection(UNKNOWN, "cafe").unwrap();

    // Callbacks arrive in registration order, connected before scanning,
    // and all before the call returns.
    assert_eq!(
        entries(&journal),
        vec![
            "ArpScan:connected_new",
            "Debug:connected_new",
            "ArpScan:scanning_in_progress",
            "Debug:scanning_in_progress",
            "ArpScan:start_scan",
        ]
    );
    let ticket = &arp.tickets()[0];
    assert_eq!(ticket.context().network_name.as_deref(), Some("cafe"));
    assert_eq!(Some(ticket.generation()), machine.context().scan_generation);
}

#[test]
fn a_revisited_network_is_known() {
    let journal = Journal::default();
    let machine = machine_with(&[RecordingPlugin::new("Debug", &journal)]);

    machine.handle_connection(UNKNOWN, "cafe").unwrap();
    machine.handle_disconnection();
    machine.handle_connection(UNKNOWN, "cafe").unwrap();

    assert_eq!(count(&journal, "Debug:connected_new"), 1);
    assert_eq!(count(&journal, "Debug:connected_known"), 1);
    assert_eq!(machine.store().networks().unwrap().len(), 1);
}

/*************************************************************
                        Idempotence
**************************************************************/

#[test]
fn repeated_connection_produces_no_duplicate_broadcast() {
    let journal = Journal::default();
    let machine = machine_with(&[RecordingPlugin::new("Debug", &journal)]);

    for _ in 0..3 {
        machine.handle_connection(HOME, "home").unwrap();
    }
    assert_eq!(entries(&journal), vec!["Debug:connected_home"]);

    machine.handle_connection(UNKNOWN, "cafe").unwrap();
    machine.handle_disconnection();
    journal.lock().unwrap().clear();

    for _ in 0..3 {
        machine.handle_connection(UNKNOWN, "cafe").unwrap();
    }
    assert_eq!(count(&journal, "Debug:connected_known"), 1);
    assert_eq!(count(&journal, "Debug:scan_completed"), 1);
}

#[test]
fn duplicate_event_during_a_scan_keeps_the_session() {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let rust = RecordingPlugin::scanner("RustScan", &journal);
    let machine = machine_with(&[arp.clone(), rust.clone()]);

    machine.handle_connection(UNKNOWN, "cafe").unwrap();
    let generation = machine.scan_session().unwrap().generation;
    for _ in 0..3 {
        assert_eq!(
            machine.handle_connection(UNKNOWN, "cafe").unwrap(),
            ConnectionState::ScanningInProgress
        );
    }

    assert_eq!(machine.scan_session().unwrap().generation, generation);
    assert_eq!(count(&journal, "ArpScan:start_scan"), 1);
    assert_eq!(count(&journal, "ArpScan:connected_known"), 0);

    arp.tickets()[0].complete();
    rust.tickets()[0].complete();
    assert_eq!(machine.state(), ConnectionState::ScanCompleted);
    assert_eq!(count(&journal, "ArpScan:scan_completed"), 1);
}

#[test]
fn duplicate_event_with_a_new_name_only_renames() {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let machine = machine_with(&[arp.clone()]);

    machine.handle_connection(UNKNOWN, "cafe").unwrap();
    machine.handle_connection(UNKNOWN, "cafe upstairs").unwrap();

    assert_eq!(count(&journal, "ArpScan:start_scan"), 1);
    assert_eq!(machine.context().network_name.as_deref(), Some("cafe upstairs"));
    assert_eq!(machine.store().networks().unwrap()[0].name, "cafe upstairs");
}

#[test]
fn repeated_transition_requests_are_silent() {
    let journal = Journal::default();
    let machine = machine_with(&[RecordingPlugin::new("Debug", &journal)]);

    assert!(machine.request_transition(ConnectionState::Alerting));
    assert!(!machine.request_transition(ConnectionState::Alerting));
    machine.handle_disconnection();
    machine.handle_disconnection();

    assert_eq!(entries(&journal), vec!["Debug:alerting", "Debug:disconnected"]);
}

/*************************************************************
                     Failure semantics
**************************************************************/

#[test]
fn store_outage_fails_the_call_and_keeps_the_state() {
    let store = Arc::new(FailingStore::default());
    let journal = Journal::default();
    let machine = ConnectionStateMachine::new(
        registry_with(&[RecordingPlugin::new("Debug", &journal)]),
        store.clone(),
        options(),
    );

    store.set_down(true);
    let err = machine.handle_connection(UNKNOWN, "cafe").unwrap_err();
    assert!(matches!(err, Error::Classification { .. }), "unexpected {err:?}");
    assert_eq!(machine.state(), ConnectionState::WaitingForNetwork);
    assert!(entries(&journal).is_empty());

    store.set_down(false);
    machine.handle_connection(UNKNOWN, "cafe").unwrap();
    assert_eq!(machine.state(), ConnectionState::ScanCompleted);
}

#[test]
fn failing_plugins_do_not_stop_delivery_or_transitions() {
    let journal = Journal::default();
    let machine = machine_with(&[
        RecordingPlugin::failing("Leds", &journal),
        RecordingPlugin::new("Debug", &journal),
    ]);

    assert_eq!(machine.handle_connection(HOME, "home").unwrap(), ConnectionState::ConnectedHome);
    assert_eq!(entries(&journal), vec!["Leds:connected_home", "Debug:connected_home"]);
}

/*************************************************************
                        Link events
**************************************************************/

#[test]
fn cable_events_walk_the_link_states() {
    let journal = Journal::default();
    let machine = machine_with(&[RecordingPlugin::new("Debug", &journal)]);

    machine.handle_cable_inserted("eth0");
    machine.handle_connection(HOME, "home").unwrap();
    machine.handle_disconnection();
    machine.handle_cable_inserted("eth0");
    machine.handle_cable_inserted("wlan0");

    assert_eq!(
        entries(&journal),
        vec![
            "Debug:connecting",
            "Debug:connected_home",
            "Debug:disconnected",
            "Debug:reconnecting"
        ]
    );
    assert!(machine.store().networks().unwrap()[0].home);
}
