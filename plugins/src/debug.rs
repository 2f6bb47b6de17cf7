//! Logs every callback it receives.

use netfang_common::alert::Alert;
use netfang_common::state::ConnectionState;
use netfang_core::{HookResult, Plugin, ScanTicket, StateContext};
use tracing::info;

pub const NAME: &str = "Debug";

#[derive(Default)]
pub struct DebugLogger;

impl DebugLogger {
    fn log(&self, state: ConnectionState, ctx: &StateContext) -> HookResult {
        info!(
            plugin = NAME,
            hw_address = ?ctx.hw_address.as_ref().map(|hw| hw.as_str()),
            network = ?ctx.network_name,
            generation = ?ctx.scan_generation,
            "{}",
            state.callback_name()
        );
        Ok(())
    }
}

impl Plugin for DebugLogger {
    fn name(&self) -> &str {
        NAME
    }

    fn on_setup(&self) -> HookResult {
        info!(plugin = NAME, "on_setup");
        Ok(())
    }

    fn on_enable(&self) -> HookResult {
        info!(plugin = NAME, "on_enable");
        Ok(())
    }

    fn on_disable(&self) -> HookResult {
        info!(plugin = NAME, "on_disable");
        Ok(())
    }

    fn on_waiting_for_network(&self, ctx: &StateContext) -> HookResult {
        self.log(ConnectionState::WaitingForNetwork, ctx)
    }

    fn on_connecting(&self, ctx: &StateContext) -> HookResult {
        self.log(ConnectionState::Connecting, ctx)
    }

    fn on_connected_home(&self, ctx: &StateContext) -> HookResult {
        self.log(ConnectionState::ConnectedHome, ctx)
    }

    fn on_connected_new(&self, ctx: &StateContext) -> HookResult {
        self.log(ConnectionState::ConnectedNew, ctx)
    }

    fn on_connected_known(&self, ctx: &StateContext) -> HookResult {
        self.log(ConnectionState::ConnectedKnown, ctx)
    }

    fn on_connected_blacklisted(&self, ctx: &StateContext) -> HookResult {
        self.log(ConnectionState::ConnectedBlacklisted, ctx)
    }

    fn on_scanning_in_progress(&self, ctx: &StateContext) -> HookResult {
        self.log(ConnectionState::ScanningInProgress, ctx)
    }

    fn on_scan_completed(&self, ctx: &StateContext) -> HookResult {
        self.log(ConnectionState::ScanCompleted, ctx)
    }

    fn on_reconnecting(&self, ctx: &StateContext) -> HookResult {
        self.log(ConnectionState::Reconnecting, ctx)
    }

    fn on_alerting(&self, ctx: &StateContext) -> HookResult {
        if let Some(alert) = &ctx.alert {
            info!(plugin = NAME, alert = %alert.id, severity = %alert.severity, "{}", alert.message);
        }
        self.log(ConnectionState::Alerting, ctx)
    }

    fn on_disconnected(&self, ctx: &StateContext) -> HookResult {
        self.log(ConnectionState::Disconnected, ctx)
    }

    fn on_alert_resolved(&self, alert: &Alert) -> HookResult {
        info!(plugin = NAME, alert = %alert.id, "on_alert_resolved");
        Ok(())
    }

    fn start_scan(&self, ticket: ScanTicket) -> HookResult {
        info!(plugin = NAME, generation = ticket.generation(), "start_scan");
        ticket.complete();
        Ok(())
    }

    fn perform_action(&self, args: &[String]) -> HookResult {
        info!(plugin = NAME, "perform_action {:?}", args);
        Ok(())
    }
}
