use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use netfang_common::alert::{AlertCategory, AlertSeverity};
use netfang_common::config::Config;
use netfang_core::ConnectionStateMachine;
use netfang_core::triggers::TriggerManager;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::event::Event;
use crate::terminal::print;

const WATCHDOG_TICK: Duration = Duration::from_secs(1);

pub async fn run(machine: Arc<ConnectionStateMachine>, config: &Config) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let triggers = TriggerManager::from_config(&config.triggers, &config.network_flows.monitored_interfaces);
    let poll = Duration::from_secs(config.triggers.poll_interval_secs.max(1));
    let trigger_task = tokio::spawn(triggers.run(machine.clone(), poll, shutdown_rx.clone()));

    let watchdog_task = config.scan_timeout_secs.map(|secs| {
        tokio::spawn(watchdog(machine.clone(), Duration::from_secs(secs), shutdown_rx.clone()))
    });

    print::print_status(format!("state {}, reading events from stdin", machine.state()));
    let stdin = BufReader::new(tokio::io::stdin());
    read_events(stdin, interrupted(), |line| handle_line(machine.clone(), line)).await?;

    // Receivers may already be gone when no trigger is configured.
    let _ = shutdown_tx.send(true);
    trigger_task.await?;
    if let Some(task) = watchdog_task {
        task.await?;
    }

    print::end_of_program();
    Ok(())
}

/// Feeds non-empty lines to `handle` until the input ends or `interrupt`
/// resolves. The interrupt also cuts short a line still being handled.
async fn read_events<R, I, H, F>(input: R, interrupt: I, mut handle: H) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = ()>,
    H: FnMut(String) -> F,
    F: Future<Output = ()>,
{
    let mut lines = input.lines();
    tokio::pin!(interrupt);
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            () = &mut interrupt => {
                info!("interrupted, shutting down");
                return Ok(());
            }
        };
        let Some(line) = line else {
            debug!("input closed");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }
        tokio::select! {
            () = handle(line) => {}
            () = &mut interrupt => {
                info!("interrupted while handling an event, shutting down");
                return Ok(());
            }
        }
    }
}

/// Resolves on Ctrl-C. Without a signal handler it never resolves.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn handle_line(machine: Arc<ConnectionStateMachine>, line: String) {
    let event: Event = match line.parse() {
        Ok(event) => event,
        Err(e) => {
            warn!("{}", e);
            return;
        }
    };

    // Transitions wait for plugin callbacks, keep them off the runtime.
    match tokio::task::spawn_blocking(move || apply(&machine, event)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("{:#}", e),
        Err(e) => error!("event task failed: {}", e),
    }
}

fn apply(machine: &ConnectionStateMachine, event: Event) -> anyhow::Result<()> {
    match event {
        Event::Cable(interface) => machine.handle_cable_inserted(&interface),
        Event::Connect { hw_address, name } => {
            machine.handle_connection(&hw_address, &name)?;
        }
        Event::Disconnect => machine.handle_disconnection(),
        Event::Done(name) => machine.notify_scan_complete(&name),
        Event::Enable(name) => {
            if !machine.registry().enable(&name)? {
                warn!(plugin = %name, "stays disabled");
            }
        }
        Event::Disable(name) => machine.registry().disable(&name)?,
        Event::Action(args) => machine.registry().perform_action(&args)?,
        Event::Force(state) => {
            if !machine.request_transition(state) {
                print::print_status(format!("already {}", state));
            }
        }
        Event::Alert(message) => {
            let id = machine.raise_alert(&message, AlertCategory::System, AlertSeverity::Warning)?;
            print::print_status(format!("alert #{} raised", id));
        }
        Event::Resolve(id) => {
            machine.resolve_alert(id)?;
        }
        Event::State => {}
    }

    print::print_status(format!("state {}", machine.state()));
    if let Some(session) = machine.scan_session() {
        print::print_status(format!(
            "scan #{} waiting on {}",
            session.generation,
            session.pending().join(", ")
        ));
    }
    Ok(())
}

/// Expires a scan session once it has been armed longer than `timeout`.
async fn watchdog(machine: Arc<ConnectionStateMachine>, timeout: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(WATCHDOG_TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(session) = machine.scan_session() else {
                    continue;
                };
                let age = (Utc::now() - session.armed_at).to_std().unwrap_or_default();
                if age < timeout {
                    continue;
                }
                let machine = machine.clone();
                let generation = session.generation;
                if let Err(e) = tokio::task::spawn_blocking(move || machine.expire_scan_session(generation)).await {
                    error!("watchdog task failed: {}", e);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return;
                }
            }
        }
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
