//! Subprocess runner shared by the scanning plugins.
//!
//! A scan runs on its own named thread so the scan-start hook returns at
//! once. The process is polled until it exits or its timeout elapses, in
//! which case it is killed. Whatever happens, the ticket is completed last.

use std::io::{BufRead, BufReader};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Context;
use netfang_core::ScanTicket;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct ScanCommand {
    /// Names the worker thread and tags the log lines.
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ScanCommand {
    pub fn new(label: impl Into<String>, program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct ScanOutput {
    pub lines: Vec<String>,
    /// `None` when the process was killed at its timeout.
    pub status: Option<ExitStatus>,
}

impl ScanOutput {
    pub fn timed_out(&self) -> bool {
        self.status.is_none()
    }

    pub fn succeeded(&self) -> bool {
        self.status.is_some_and(|status| status.success())
    }
}

/// Runs `command` to completion on the calling thread.
pub fn run(command: &ScanCommand) -> anyhow::Result<ScanOutput> {
    debug!(scan = %command.label, "running {} {}", command.program, command.args.join(" "));

    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to start {}", command.program))?;

    let stdout = child.stdout.take().context("child stdout was not captured")?;
    let reader = thread::spawn(move || {
        BufReader::new(stdout)
            .lines()
            .map_while(Result::ok)
            .collect::<Vec<_>>()
    });

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().context("failed to poll scan process")? {
            break Some(status);
        }
        if started.elapsed() >= command.timeout {
            warn!(scan = %command.label, "scan timed out after {:?}, killing it", command.timeout);
            if let Err(e) = child.kill() {
                warn!(scan = %command.label, "failed to kill scan process: {}", e);
            }
            child.wait().context("failed to reap scan process")?;
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let lines = reader.join().unwrap_or_default();
    Ok(ScanOutput { lines, status })
}

/// Runs `command` on a worker thread, hands the outcome to `on_done`, then
/// completes `ticket`. Manual scans pass no ticket.
pub fn spawn<F>(command: ScanCommand, ticket: Option<ScanTicket>, on_done: F) -> anyhow::Result<JoinHandle<()>>
where
    F: FnOnce(anyhow::Result<ScanOutput>) + Send + 'static,
{
    thread::Builder::new()
        .name(format!("scan-{}", command.label))
        .spawn(move || {
            let outcome = run(&command);
            on_done(outcome);
            if let Some(ticket) = ticket {
                ticket.complete();
            }
        })
        .context("failed to spawn scan worker")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
