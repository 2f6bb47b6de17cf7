use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use netfang_common::alert::{AlertCategory, AlertSeverity};
use netfang_common::state::ConnectionState;
use netfang_core::triggers::{AlertTemplate, Condition, Trigger, TriggerManager};
use tokio::sync::watch;

use crate::support::*;

struct Switch(Arc<AtomicBool>);

#[async_trait]
impl Condition for Switch {
    async fn check(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn overheating(switch: &Arc<AtomicBool>) -> TriggerManager {
    let mut manager = TriggerManager::new();
    manager.add(Trigger::new(
        "cpu_overheat",
        Box::new(Switch(switch.clone())),
        AlertTemplate {
            message: "CPU temperature above threshold".into(),
            category: AlertCategory::Hardware,
            severity: AlertSeverity::Warning,
        },
    ));
    manager
}

/*************************************************************
                  Alerts during a scan session
**************************************************************/

#[tokio::test]
async fn alert_abandons_the_running_scan() -> anyhow::Result<()> {
    let journal = Journal::default();
    let arp = RecordingPlugin::scanner("ArpScan", &journal);
    let machine = machine_with(&[arp.clone()]);
    machine.handle_connection(UNKNOWN, "cafe")?;
    let generation = machine.scan_session().map(|s| s.generation);

    let switch = Arc::new(AtomicBool::new(true));
    let mut manager = overheating(&switch);
    assert_eq!(manager.check_triggers(&machine).await, 1);

    assert_eq!(machine.state(), ConnectionState::Alerting);
    assert!(machine.scan_session().is_none());
    let alert = machine.context().alert.expect("alert in context");
    assert_eq!(alert.session_id, generation);
    assert!(alert.network_id.is_some());

    // The worker finishing afterwards belongs to a dead session.
    arp.tickets()[0].complete();
    assert_eq!(machine.state(), ConnectionState::Alerting);
    assert_eq!(count(&journal, "ArpScan:scan_completed"), 0);
    Ok(())
}

#[tokio::test]
async fn resolution_reaches_plugins_without_moving_state() -> anyhow::Result<()> {
    let journal = Journal::default();
    let debug = RecordingPlugin::new("Debug", &journal);
    let machine = machine_with(&[debug]);

    let switch = Arc::new(AtomicBool::new(true));
    overheating(&switch).check_triggers(&machine).await;
    let id = machine.context().alert.map(|a| a.id).expect("alert raised");

    let resolved = tokio::task::spawn_blocking({
        let machine = machine.clone();
        move || machine.resolve_alert(id)
    })
    .await??;

    assert!(resolved.resolved);
    assert_eq!(machine.state(), ConnectionState::Alerting);
    assert!(machine.context().alert.is_some_and(|a| a.resolved));
    assert_eq!(entries(&journal), vec!["Debug:alerting", "Debug:alert_resolved"]);
    Ok(())
}

#[tokio::test]
async fn trigger_loop_raises_and_stops() {
    let journal = Journal::default();
    let machine = machine_with(&[RecordingPlugin::new("Debug", &journal)]);
    let switch = Arc::new(AtomicBool::new(false));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(overheating(&switch).run(
        machine.clone(),
        Duration::from_millis(10),
        shutdown_rx,
    ));

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(machine.state(), ConnectionState::WaitingForNetwork);

    switch.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(80)).await;
    shutdown_tx.send(true).unwrap();
    task.await.unwrap();

    assert_eq!(machine.state(), ConnectionState::Alerting);
    assert_eq!(count(&journal, "Debug:alerting"), 1);
}
