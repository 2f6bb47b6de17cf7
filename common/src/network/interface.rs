//! Link status of the interfaces the device watches.

use pnet::datalink::{self, NetworkInterface};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LinkStatus {
    /// Administratively up with carrier.
    Up,
    /// Administratively up but the link has no carrier (cable unplugged).
    NoCarrier,
    /// The interface is operationally down.
    Down,
    /// No interface with that name exists.
    Missing,
}

impl LinkStatus {
    pub fn is_up(self) -> bool {
        self == LinkStatus::Up
    }
}

/// Looks up `name` in `interfaces` and reports its link status.
pub fn link_status(name: &str, interfaces: &[NetworkInterface]) -> LinkStatus {
    let Some(interface) = interfaces.iter().find(|i| i.name == name) else {
        return LinkStatus::Missing;
    };

    if !interface.is_up() {
        return LinkStatus::Down;
    }
    if !has_carrier(interface) {
        return LinkStatus::NoCarrier;
    }
    LinkStatus::Up
}

/// Link status of `name` on this machine.
pub fn current_link_status(name: &str) -> LinkStatus {
    link_status(name, &datalink::interfaces())
}

#[cfg(unix)]
fn has_carrier(interface: &NetworkInterface) -> bool {
    interface.is_running()
}

#[cfg(not(unix))]
fn has_carrier(_interface: &NetworkInterface) -> bool {
    true
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
