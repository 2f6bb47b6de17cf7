//! # Netfang Core
//!
//! The connection lifecycle orchestrator: a state machine fed by link and
//! connection events, a registry of plugins reacting to its transitions,
//! and a scan barrier that holds the machine in
//! [`ConnectionState::ScanningInProgress`](netfang_common::state::ConnectionState)
//! until every scan-capable plugin has reported back.
//!
//! Everything here is synchronous and thread-safe. Only the alert triggers
//! run on tokio.

pub mod barrier;
pub mod dispatcher;
pub mod error;
pub mod machine;
pub mod notifier;
pub mod plugin;
pub mod registry;
pub mod store;
pub mod triggers;
pub mod vendors;

pub use error::{Error, Result};
pub use machine::{Classification, ConnectionStateMachine, MachineOptions};
pub use notifier::{CompletionNotifier, CompletionSink, ScanTicket};
pub use plugin::{HookResult, Plugin, PluginError, StateContext};
pub use registry::{PluginDescriptor, PluginHandle, PluginRegistry};
