use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::*;
use netfang_common::state::ConnectionState;
use netfang_core::ConnectionStateMachine;

use crate::terminal::{colors, print, spinner::Spinner};

const POLL: Duration = Duration::from_millis(200);

pub async fn simulate(
    machine: Arc<ConnectionStateMachine>,
    hw_address: String,
    name: String,
    wait: u64,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let connect = machine.clone();
    let entered = tokio::task::spawn_blocking(move || connect.handle_connection(&hw_address, &name)).await??;
    print::aligned_line("Entered", 8, entered.to_string().color(colors::ACCENT));

    if machine.state() == ConnectionState::ScanningInProgress {
        let deadline = Duration::from_secs(wait);
        let spinner = Spinner::start("waiting for scans");
        while machine.state() == ConnectionState::ScanningInProgress && started.elapsed() < deadline {
            if let Some(session) = machine.scan_session() {
                spinner.set_message(format!(
                    "waiting on {}",
                    session.pending().join(", ").color(colors::PRIMARY)
                ));
            }
            tokio::time::sleep(POLL).await;
        }
        drop(spinner);
    }

    let context = machine.context();
    print::aligned_line("State", 8, machine.state().to_string().color(colors::ACCENT));
    if let Some(hw) = &context.hw_address {
        print::aligned_line("Network", 8, format!("{} ({})", context.network_name.as_deref().unwrap_or("?"), hw));
    }
    if let Some(session) = machine.scan_session() {
        print::aligned_line("Pending", 8, session.pending().join(", ").yellow());
    }
    print::aligned_line("Elapsed", 8, format!("{:.2}s", started.elapsed().as_secs_f64()));
    print::end_of_program();
    Ok(())
}
