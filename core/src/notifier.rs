//! Narrow completion handles given to scan workers instead of a reference
//! to the whole orchestrator.

use std::sync::Weak;

use tracing::debug;

use crate::plugin::StateContext;

/// Sentinel plugin name marking every expected entry of a session reported.
pub const ALL: &str = "all";

/// Receives scan-completion reports. Implemented by the state machine.
pub trait CompletionSink: Send + Sync {
    /// `generation: None` targets whichever session is live.
    fn report_scan_complete(&self, generation: Option<u64>, name: &str);
}

/// Handed to one expected plugin with its scan-start signal.
#[derive(Clone)]
pub struct ScanTicket {
    plugin: String,
    generation: u64,
    context: StateContext,
    sink: Weak<dyn CompletionSink>,
}

impl ScanTicket {
    pub fn new(
        plugin: impl Into<String>,
        generation: u64,
        context: StateContext,
        sink: Weak<dyn CompletionSink>,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            generation,
            context,
            sink,
        }
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The connection the scan was armed for.
    pub fn context(&self) -> &StateContext {
        &self.context
    }

    /// Reports this plugin's scan as finished. Safe from any thread; reports
    /// for an abandoned generation are discarded by the barrier.
    pub fn complete(&self) {
        match self.sink.upgrade() {
            Some(sink) => sink.report_scan_complete(Some(self.generation), &self.plugin),
            None => debug!(plugin = %self.plugin, "orchestrator gone, dropping scan report"),
        }
    }
}

/// Untagged completion channel for collaborators outside a scan session,
/// e.g. an operator marking a scan done by hand.
#[derive(Clone)]
pub struct CompletionNotifier {
    sink: Weak<dyn CompletionSink>,
}

impl CompletionNotifier {
    pub fn new(sink: Weak<dyn CompletionSink>) -> Self {
        Self { sink }
    }

    /// `name_or_all` is a plugin name or [`ALL`].
    pub fn notify_scan_complete(&self, name_or_all: &str) {
        if let Some(sink) = self.sink.upgrade() {
            sink.report_scan_complete(None, name_or_all);
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
