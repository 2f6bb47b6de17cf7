use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use netfang_common::state::ConnectionState;

use crate::support::*;

const SCANNERS: [&str; 6] = ["ArpScan", "RustScan", "Nmap", "Nikto", "Masscan", "Responder"];

fn scanners(journal: &Journal) -> Vec<Arc<RecordingPlugin>> {
    SCANNERS
        .iter()
        .map(|name| RecordingPlugin::scanner(name, journal))
        .collect()
}

/*************************************************************
              All-of-N join under contention
**************************************************************/

#[test]
fn racing_reports_fire_exactly_one_completion() {
    for _ in 0..20 {
        let journal = Journal::default();
        let plugins = scanners(&journal);
        let machine = machine_with(&plugins);
        machine.handle_connection(UNKNOWN, "cafe").unwrap();

        // Every ticket reported twice, plus a few sentinels, all at once.
        let mut reporters = Vec::new();
        for plugin in &plugins {
            reporters.push(plugin.tickets()[0].clone());
            reporters.push(plugin.tickets()[0].clone());
        }
        let gate = Arc::new(Barrier::new(reporters.len() + 2));

        let mut workers: Vec<_> = reporters
            .into_iter()
            .map(|ticket| {
                let gate = gate.clone();
                thread::spawn(move || {
                    gate.wait();
                    ticket.complete();
                })
            })
            .collect();
        for _ in 0..2 {
            let gate = gate.clone();
            let notifier = machine.notifier();
            workers.push(thread::spawn(move || {
                gate.wait();
                notifier.notify_scan_complete("all");
            }));
        }
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(machine.state(), ConnectionState::ScanCompleted);
        assert_eq!(count(&journal, "ArpScan:scan_completed"), 1);
        assert!(machine.scan_session().is_none());
    }
}

#[test]
fn reports_racing_a_disconnection_never_complete_it() {
    for _ in 0..20 {
        let journal = Journal::default();
        let plugins = scanners(&journal);
        let machine = machine_with(&plugins);
        machine.handle_connection(UNKNOWN, "cafe").unwrap();

        let tickets: Vec<_> = plugins.iter().map(|p| p.tickets()[0].clone()).collect();
        let gate = Arc::new(Barrier::new(tickets.len() + 1));

        let mut workers: Vec<_> = tickets
            .into_iter()
            .map(|ticket| {
                let gate = gate.clone();
                thread::spawn(move || {
                    gate.wait();
                    ticket.complete();
                })
            })
            .collect();
        let disconnector = machine.clone();
        let disconnect_gate = gate.clone();
        workers.push(thread::spawn(move || {
            disconnect_gate.wait();
            disconnector.handle_disconnection();
        }));
        for worker in workers {
            worker.join().unwrap();
        }

        // Either the scan finished first and then the link dropped, or the
        // session was abandoned. Never a completion after the disconnect.
        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert!(machine.scan_session().is_none());
        let log = entries(&journal);
        let disconnected = log.iter().position(|e| e == "ArpScan:disconnected").unwrap();
        assert!(!log[disconnected..].iter().any(|e| e.ends_with(":scan_completed")));
    }
}

#[test]
fn racing_duplicate_connections_arm_one_session() {
    for _ in 0..20 {
        let journal = Journal::default();
        let plugins = scanners(&journal);
        let machine = machine_with(&plugins);
        let gate = Arc::new(Barrier::new(8));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let machine = machine.clone();
                let gate = gate.clone();
                thread::spawn(move || {
                    gate.wait();
                    machine.handle_connection(UNKNOWN, "cafe").unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(count(&journal, "ArpScan:start_scan"), 1);
        assert_eq!(count(&journal, "ArpScan:scanning_in_progress"), 1);
        for plugin in &plugins {
            plugin.tickets()[0].complete();
        }
        assert_eq!(machine.state(), ConnectionState::ScanCompleted);
    }
}

/*************************************************************
                 Many producers, one machine
**************************************************************/

#[test]
fn concurrent_producers_keep_state_and_session_consistent() {
    let journal = Journal::default();
    let plugins = scanners(&journal);
    let machine = machine_with(&plugins);
    let gate = Arc::new(Barrier::new(4));

    let connector = {
        let machine = machine.clone();
        let gate = gate.clone();
        thread::spawn(move || {
            gate.wait();
            for i in 0..50 {
                let hw = format!("02:00:00:00:00:{:02X}", i % 8);
                machine.handle_connection(&hw, "roaming").unwrap();
            }
        })
    };
    let disconnector = {
        let machine = machine.clone();
        let gate = gate.clone();
        thread::spawn(move || {
            gate.wait();
            for _ in 0..50 {
                machine.handle_disconnection();
                machine.handle_cable_inserted("eth0");
                thread::sleep(Duration::from_micros(50));
            }
        })
    };
    let reporter = {
        let machine = machine.clone();
        let plugins = plugins.clone();
        let gate = gate.clone();
        thread::spawn(move || {
            gate.wait();
            for _ in 0..200 {
                for plugin in &plugins {
                    if let Some(ticket) = plugin.tickets().last() {
                        ticket.complete();
                    }
                }
                let _ = machine.state();
            }
        })
    };

    gate.wait();
    for worker in [connector, disconnector, reporter] {
        worker.join().unwrap();
    }

    // A live session implies the scanning state, whatever the interleaving.
    match machine.scan_session() {
        Some(_) => assert_eq!(machine.state(), ConnectionState::ScanningInProgress),
        None => assert_ne!(machine.state(), ConnectionState::ScanningInProgress),
    }
}

#[test]
fn completion_from_a_callback_thread_does_not_deadlock() {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let machine = machine_with(&[arp.clone()]);
    machine.handle_connection(UNKNOWN, "cafe").unwrap();

    let ticket = arp.tickets()[0].clone();
    let worker = thread::spawn(move || ticket.complete());
    worker.join().unwrap();

    assert!(wait_for(&machine, ConnectionState::ScanCompleted, Duration::from_secs(5)));
}
