//! # Plugin Interface
//!
//! A plugin is a unit of behaviour reacting to lifecycle transitions.
//! Implementors override the hooks they care about; every hook has a no-op
//! default except the toggling ones.
//!
//! Scan capability is declared through [`Plugin::is_scan_capable`] and never
//! inferred. Scan-capable plugins receive a [`ScanTicket`] through
//! [`Plugin::start_scan`] when a scan session is armed and must call
//! [`ScanTicket::complete`] once their scan is over, from whichever thread
//! ran it.

use netfang_common::alert::Alert;
use netfang_common::network::identity::NetworkId;
use netfang_common::network::mac::HwAddress;
use netfang_common::state::ConnectionState;

use crate::notifier::ScanTicket;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("{0}")]
    Failed(String),
    #[error("plugin '{plugin}' has no action '{action}'")]
    UnknownAction { plugin: String, action: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type HookResult = Result<(), PluginError>;

/// What the state machine knows when it enters a state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateContext {
    pub hw_address: Option<HwAddress>,
    pub network_name: Option<String>,
    pub network_id: Option<NetworkId>,
    pub interface: Option<String>,
    pub scan_generation: Option<u64>,
    pub alert: Option<Alert>,
}

pub trait Plugin: Send + Sync {
    /// Unique, compared case-insensitively.
    fn name(&self) -> &str;

    fn is_scan_capable(&self) -> bool {
        false
    }

    fn on_setup(&self) -> HookResult {
        Ok(())
    }

    fn on_enable(&self) -> HookResult;

    fn on_disable(&self) -> HookResult;

    fn on_waiting_for_network(&self, _ctx: &StateContext) -> HookResult {
        Ok(())
    }

    fn on_connecting(&self, _ctx: &StateContext) -> HookResult {
        Ok(())
    }

    fn on_connected_home(&self, _ctx: &StateContext) -> HookResult {
        Ok(())
    }

    fn on_connected_new(&self, _ctx: &StateContext) -> HookResult {
        Ok(())
    }

    fn on_connected_known(&self, _ctx: &StateContext) -> HookResult {
        Ok(())
    }

    fn on_connected_blacklisted(&self, _ctx: &StateContext) -> HookResult {
        Ok(())
    }

    fn on_scanning_in_progress(&self, _ctx: &StateContext) -> HookResult {
        Ok(())
    }

    fn on_scan_completed(&self, _ctx: &StateContext) -> HookResult {
        Ok(())
    }

    fn on_reconnecting(&self, _ctx: &StateContext) -> HookResult {
        Ok(())
    }

    fn on_alerting(&self, _ctx: &StateContext) -> HookResult {
        Ok(())
    }

    fn on_disconnected(&self, _ctx: &StateContext) -> HookResult {
        Ok(())
    }

    fn on_alert_resolved(&self, _alert: &Alert) -> HookResult {
        Ok(())
    }

    /// Scan-start signal. Must return quickly: the scan itself belongs on
    /// the plugin's own worker. The default reports completion at once.
    fn start_scan(&self, ticket: ScanTicket) -> HookResult {
        ticket.complete();
        Ok(())
    }

    /// Out-of-band trigger, e.g. a manual scan request.
    fn perform_action(&self, _args: &[String]) -> HookResult {
        Ok(())
    }

    /// Entry point for dependency references naming this plugin.
    fn run_setup_action(&self, action: &str) -> HookResult {
        match action {
            "on_setup" => self.on_setup(),
            _ => Err(PluginError::UnknownAction {
                plugin: self.name().to_string(),
                action: action.to_string(),
            }),
        }
    }
}

/// Invokes the hook matching `state`.
pub(crate) fn invoke_state_hook(
    plugin: &dyn Plugin,
    state: ConnectionState,
    ctx: &StateContext,
) -> HookResult {
    match state {
        ConnectionState::WaitingForNetwork => plugin.on_waiting_for_network(ctx),
        ConnectionState::Connecting => plugin.on_connecting(ctx),
        ConnectionState::ConnectedHome => plugin.on_connected_home(ctx),
        ConnectionState::ConnectedNew => plugin.on_connected_new(ctx),
        ConnectionState::ConnectedKnown => plugin.on_connected_known(ctx),
        ConnectionState::ConnectedBlacklisted => plugin.on_connected_blacklisted(ctx),
        ConnectionState::ScanningInProgress => plugin.on_scanning_in_progress(ctx),
        ConnectionState::ScanCompleted => plugin.on_scan_completed(ctx),
        ConnectionState::Reconnecting => plugin.on_reconnecting(ctx),
        ConnectionState::Alerting => plugin.on_alerting(ctx),
        ConnectionState::Disconnected => plugin.on_disconnected(ctx),
    }
}
