//! The connectivity lifecycle of the device.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Exactly one of these is current at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    WaitingForNetwork,
    Connecting,
    ConnectedHome,
    ConnectedNew,
    ConnectedKnown,
    ConnectedBlacklisted,
    ScanningInProgress,
    ScanCompleted,
    Reconnecting,
    Alerting,
    Disconnected,
}

impl ConnectionState {
    pub const ALL: [ConnectionState; 11] = [
        ConnectionState::WaitingForNetwork,
        ConnectionState::Connecting,
        ConnectionState::ConnectedHome,
        ConnectionState::ConnectedNew,
        ConnectionState::ConnectedKnown,
        ConnectionState::ConnectedBlacklisted,
        ConnectionState::ScanningInProgress,
        ConnectionState::ScanCompleted,
        ConnectionState::Reconnecting,
        ConnectionState::Alerting,
        ConnectionState::Disconnected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::WaitingForNetwork => "WAITING_FOR_NETWORK",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::ConnectedHome => "CONNECTED_HOME",
            ConnectionState::ConnectedNew => "CONNECTED_NEW",
            ConnectionState::ConnectedKnown => "CONNECTED_KNOWN",
            ConnectionState::ConnectedBlacklisted => "CONNECTED_BLACKLISTED",
            ConnectionState::ScanningInProgress => "SCANNING_IN_PROGRESS",
            ConnectionState::ScanCompleted => "SCAN_COMPLETED",
            ConnectionState::Reconnecting => "RECONNECTING",
            ConnectionState::Alerting => "ALERTING",
            ConnectionState::Disconnected => "DISCONNECTED",
        }
    }

    /// Name of the plugin hook invoked when this state is entered.
    pub fn callback_name(self) -> &'static str {
        match self {
            ConnectionState::WaitingForNetwork => "on_waiting_for_network",
            ConnectionState::Connecting => "on_connecting",
            ConnectionState::ConnectedHome => "on_connected_home",
            ConnectionState::ConnectedNew => "on_connected_new",
            ConnectionState::ConnectedKnown => "on_connected_known",
            ConnectionState::ConnectedBlacklisted => "on_connected_blacklisted",
            ConnectionState::ScanningInProgress => "on_scanning_in_progress",
            ConnectionState::ScanCompleted => "on_scan_completed",
            ConnectionState::Reconnecting => "on_reconnecting",
            ConnectionState::Alerting => "on_alerting",
            ConnectionState::Disconnected => "on_disconnected",
        }
    }

    /// States reached while attached to an identified network.
    pub fn is_attached(self) -> bool {
        matches!(
            self,
            ConnectionState::ConnectedHome
                | ConnectionState::ConnectedNew
                | ConnectionState::ConnectedKnown
                | ConnectionState::ConnectedBlacklisted
                | ConnectionState::ScanningInProgress
                | ConnectionState::ScanCompleted
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionState {
    type Err = String;

    /// Accepts the screaming form (`SCAN_COMPLETED`) in any case, with `-` or `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        ConnectionState::ALL
            .into_iter()
            .find(|state| state.as_str() == wanted)
            .ok_or_else(|| format!("unknown connection state: {s}"))
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
