use netfang_common::state::ConnectionState;

use crate::support::*;

/*************************************************************
                         Arming
**************************************************************/

#[test]
fn empty_scan_set_completes_synchronously() {
    let journal = Journal::default();
    let machine = machine_with(&[RecordingPlugin::new("Debug", &journal)]);

    let state = machine.handle_connection(UNKNOWN, "cafe").unwrap();

    assert_eq!(state, ConnectionState::ScanCompleted);
    assert_eq!(
        entries(&journal),
        vec!["Debug:connected_new", "Debug:scanning_in_progress", "Debug:scan_completed"]
    );
}

#[test]
fn two_scanners_must_both_report() {
    let journal = Journal::default();
    let machine = machine_with(&[
        RecordingPlugin::scanner("ArpScan", &journal),
        RecordingPlugin::scanner("RustScan", &journal),
    ]);

    assert_eq!(
        machine.handle_connection(UNKNOWN, "cafe").unwrap(),
        ConnectionState::ScanningInProgress
    );
    let session = machine.scan_session().unwrap();
    let expected: Vec<&str> = session.expected.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(expected, vec!["ArpScan", "RustScan"]);

    machine.notify_scan_complete("arpscan");
    assert_eq!(machine.state(), ConnectionState::ScanningInProgress);

    machine.notify_scan_complete("RUSTSCAN");
    assert_eq!(machine.state(), ConnectionState::ScanCompleted);
    assert_eq!(count(&journal, "ArpScan:scan_completed"), 1);
}

#[test]
fn sentinel_completes_everyone() {
    let journal = Journal::default();
    let machine = machine_with(&[
        RecordingPlugin::scanner("ArpScan", &journal),
        RecordingPlugin::scanner("RustScan", &journal),
    ]);
    machine.handle_connection(UNKNOWN, "cafe").unwrap();

    machine.notifier().notify_scan_complete("all");
    assert_eq!(machine.state(), ConnectionState::ScanCompleted);
}

/*************************************************************
                  Abandonment and late reports
**************************************************************/

#[test]
fn disconnection_abandons_and_late_reports_are_ignored() {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let machine = machine_with(&[arp.clone()]);
    machine.handle_connection(UNKNOWN, "cafe").unwrap();

    machine.handle_disconnection();
    assert_eq!(machine.state(), ConnectionState::Disconnected);
    assert!(machine.scan_session().is_none());

    for ticket in arp.tickets() {
        ticket.complete();
    }
    machine.notify_scan_complete("ArpScan");
    assert_eq!(machine.state(), ConnectionState::Disconnected);
    assert_eq!(count(&journal, "ArpScan:scan_completed"), 0);
}

#[test]
fn stale_ticket_does_not_complete_the_next_session() {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let machine = machine_with(&[arp.clone()]);

    machine.handle_connection(UNKNOWN, "cafe").unwrap();
    let stale = arp.tickets()[0].clone();
    machine.handle_disconnection();
    machine.handle_connection(UNKNOWN, "cafe").unwrap();
    let fresh = machine.scan_session().unwrap().generation;
    assert!(fresh > stale.generation());

    stale.complete();
    assert_eq!(machine.state(), ConnectionState::ScanningInProgress);

    arp.tickets()[1].complete();
    assert_eq!(machine.state(), ConnectionState::ScanCompleted);
}

#[test]
fn manual_override_abandons_the_session() {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let machine = machine_with(&[arp.clone()]);
    machine.handle_connection(UNKNOWN, "cafe").unwrap();

    assert!(machine.request_transition(ConnectionState::ScanCompleted));
    assert!(machine.scan_session().is_none());

    arp.tickets()[0].complete();
    assert_eq!(count(&journal, "ArpScan:scan_completed"), 1);
}

/*************************************************************
                    Snapshot semantics
**************************************************************/

#[test]
fn disabling_mid_scan_keeps_the_armed_expectation() {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let rust = RecordingPlugin::scanner("RustScan", &journal);
    let machine = machine_with(&[arp.clone(), rust.clone()]);
    machine.handle_connection(UNKNOWN, "cafe").unwrap();

    machine.registry().disable("RustScan").unwrap();
    machine.notify_scan_complete("ArpScan");
    assert_eq!(machine.state(), ConnectionState::ScanningInProgress);
    assert_eq!(machine.scan_session().unwrap().pending(), vec!["RustScan"]);

    rust.tickets()[0].complete();
    assert_eq!(machine.state(), ConnectionState::ScanCompleted);

    // The next session no longer expects it.
    machine.handle_disconnection();
    machine.handle_connection(UNKNOWN, "cafe").unwrap();
    let expected: Vec<String> = machine
        .scan_session()
        .unwrap()
        .expected
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(expected, vec!["ArpScan".to_string()]);
}

#[test]
fn enabled_late_reporter_joins_and_unknown_is_ignored() {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let logger = RecordingPlugin::new("Debug", &journal);
    let machine = machine_with(&[arp.clone(), logger]);
    machine.handle_connection(UNKNOWN, "cafe").unwrap();

    machine.notify_scan_complete("debug");
    machine.notify_scan_complete("Nmap");
    let session = machine.scan_session().unwrap();
    assert_eq!(session.expected.len(), 2);
    assert!(session.expected[1].late);

    arp.tickets()[0].complete();
    assert_eq!(machine.state(), ConnectionState::ScanCompleted);
}
