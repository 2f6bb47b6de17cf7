//! # Connection State Machine
//!
//! The authoritative connection state of the device. Every mutation, no
//! matter which thread asks for it, goes through one mutex guarding both
//! the current state and the scan barrier, so a live scan session always
//! implies [`ConnectionState::ScanningInProgress`].
//!
//! Plugin callbacks never run under that mutex. A transition enqueues its
//! broadcast on the [`EventDispatcher`] while still locked, releases the
//! lock, then waits until the broadcast has been delivered.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use netfang_common::alert::{Alert, AlertCategory, AlertId, AlertSeverity, NewAlert};
use netfang_common::config::{Config, ConfigError};
use netfang_common::network::identity::NetworkIdentity;
use netfang_common::network::mac::HwAddress;
use netfang_common::state::ConnectionState;
use tracing::{debug, info, warn};

use crate::barrier::{ArmOutcome, ReleaseOutcome, ReportOutcome, ScanBarrier, ScanSession};
use crate::dispatcher::{DeliveryTicket, EventDispatcher, LifecycleEvent};
use crate::error::{Error, Result};
use crate::notifier::{ALL, CompletionNotifier, CompletionSink, ScanTicket};
use crate::plugin::StateContext;
use crate::registry::PluginRegistry;
use crate::store::NetworkStore;

/// How a network was classified when the device attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Home,
    Blacklisted,
    New,
    Known,
}

impl Classification {
    pub fn connected_state(self) -> ConnectionState {
        match self {
            Classification::Home => ConnectionState::ConnectedHome,
            Classification::Blacklisted => ConnectionState::ConnectedBlacklisted,
            Classification::New => ConnectionState::ConnectedNew,
            Classification::Known => ConnectionState::ConnectedKnown,
        }
    }

    /// Trusted and untrusted networks are never scanned.
    pub fn scans(self) -> bool {
        matches!(self, Classification::New | Classification::Known)
    }

    /// Whether `later`, seen for the address currently attached, still
    /// describes the same visit. The first event records a new network, so
    /// repeats of it read back as known, and racing repeats may classify
    /// before or after that record lands.
    fn same_visit(self, later: Classification) -> bool {
        self == later || (self.scans() && later.scans())
    }
}

/// Plain values the machine needs from the configuration.
#[derive(Debug, Clone, Default)]
pub struct MachineOptions {
    pub home_network: Option<HwAddress>,
    pub blacklisted: Vec<HwAddress>,
    /// Empty accepts link events from every interface.
    pub monitored_interfaces: Vec<String>,
}

impl MachineOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            home_network: config.home_address().map_err(ConfigError::from)?,
            blacklisted: config.blacklisted_addresses().map_err(ConfigError::from)?,
            monitored_interfaces: config.network_flows.monitored_interfaces.clone(),
        })
    }
}

struct MachineState {
    current: ConnectionState,
    context: StateContext,
    /// Address and classification of the network attached to, as of the
    /// event that attached it.
    connection: Option<(HwAddress, Classification)>,
    barrier: ScanBarrier,
}

pub struct ConnectionStateMachine {
    this: Weak<ConnectionStateMachine>,
    store: Arc<dyn NetworkStore>,
    dispatcher: EventDispatcher,
    options: MachineOptions,
    state: Mutex<MachineState>,
}

impl ConnectionStateMachine {
    pub fn new(
        registry: Arc<PluginRegistry>,
        store: Arc<dyn NetworkStore>,
        options: MachineOptions,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            store,
            dispatcher: EventDispatcher::new(registry),
            options,
            state: Mutex::new(MachineState {
                current: ConnectionState::WaitingForNetwork,
                context: StateContext::default(),
                connection: None,
                barrier: ScanBarrier::new(),
            }),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().current
    }

    pub fn context(&self) -> StateContext {
        self.lock().context.clone()
    }

    /// Copy of the live scan session, if any.
    pub fn scan_session(&self) -> Option<ScanSession> {
        self.lock().barrier.session().cloned()
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        self.dispatcher.registry()
    }

    pub fn store(&self) -> &Arc<dyn NetworkStore> {
        &self.store
    }

    /// Completion channel for collaborators that only need to report.
    pub fn notifier(&self) -> CompletionNotifier {
        CompletionNotifier::new(self.sink())
    }

    /// Classifies the network behind `hw_address`, records it and moves to
    /// the matching connected state. New and known networks continue
    /// straight into a scan.
    ///
    /// Returns the state once every callback of this call is delivered. On
    /// error the state is left untouched.
    pub fn handle_connection(&self, hw_address: &str, network_name: &str) -> Result<ConnectionState> {
        let hw: HwAddress = hw_address
            .parse()
            .map_err(|_| Error::InvalidHardwareAddress(hw_address.to_string()))?;

        let existing = self
            .store
            .find_network(&hw)
            .map_err(|source| Error::Classification {
                hw_address: hw.clone(),
                source,
            })?;
        let classification = self.classify(&hw, existing.as_ref());
        // Only the stored flag is persisted. A configured blacklist entry
        // stops applying once it is removed from the configuration.
        let stored_blacklisted = existing.as_ref().is_some_and(|network| network.blacklisted);
        let identity = self.store.upsert_network(
            &hw,
            network_name,
            stored_blacklisted,
            classification == Classification::Home,
        )?;
        debug!(hw_address = %hw, ?classification, "network classified");

        let mut state = self.lock();
        let same_visit = matches!(
            &state.connection,
            Some((attached, first)) if *attached == hw && first.same_visit(classification)
        );
        if state.current.is_attached() && same_visit {
            debug!(hw_address = %hw, state = %state.current, "already attached, nothing to do");
            state.context.network_name = Some(identity.name);
            return Ok(state.current);
        }

        state.connection = Some((hw, classification));
        state.context = attach_context(&identity, state.context.interface.clone());
        let mut ticket = self.enter(&mut state, classification.connected_state());
        if classification.scans() {
            ticket = self.enter(&mut state, ConnectionState::ScanningInProgress);
        }
        Ok(self.finish(state, ticket))
    }

    /// Moves to `Disconnected`, abandoning any live scan session.
    pub fn handle_disconnection(&self) {
        let mut state = self.lock();
        if state.current == ConnectionState::Disconnected {
            return;
        }
        detach(&mut state);
        let ticket = self.enter(&mut state, ConnectionState::Disconnected);
        self.finish(state, ticket);
    }

    pub fn handle_cable_inserted(&self, interface: &str) {
        if !self.is_monitored(interface) {
            debug!(interface, "link event on an unmonitored interface, ignoring");
            return;
        }

        let mut state = self.lock();
        let next = match state.current {
            ConnectionState::Connecting | ConnectionState::Reconnecting => return,
            ConnectionState::Disconnected => ConnectionState::Reconnecting,
            ConnectionState::WaitingForNetwork => ConnectionState::Connecting,
            _ => {
                detach(&mut state);
                ConnectionState::WaitingForNetwork
            }
        };
        state.context.interface = Some(interface.to_string());
        let ticket = self.enter(&mut state, next);
        self.finish(state, ticket);
    }

    /// Forces `next`. Returns `false` when the machine was already there.
    pub fn request_transition(&self, next: ConnectionState) -> bool {
        let mut state = self.lock();
        if state.current == next {
            debug!(state = %next, "already in requested state");
            return false;
        }
        if !next.is_attached() && next != ConnectionState::Alerting {
            detach(&mut state);
        }
        let ticket = self.enter(&mut state, next);
        self.finish(state, ticket);
        true
    }

    /// Reports `name` (or `all`) done for whichever session is live.
    pub fn notify_scan_complete(&self, name_or_all: &str) {
        self.report_scan_complete(None, name_or_all);
    }

    /// Completes `generation` on behalf of every plugin still pending.
    pub fn expire_scan_session(&self, generation: u64) {
        if let Some(session) = self.scan_session() {
            if session.generation == generation {
                warn!(generation, pending = ?session.pending(), "scan session timed out");
            }
        }
        self.report_scan_complete(Some(generation), ALL);
    }

    /// Records an alert against the current network and enters `Alerting`.
    /// Raising while already alerting broadcasts `on_alerting` again.
    pub fn raise_alert(
        &self,
        message: &str,
        category: AlertCategory,
        severity: AlertSeverity,
    ) -> Result<AlertId> {
        let (network_id, session_id) = {
            let state = self.lock();
            (state.context.network_id, state.barrier.generation())
        };
        let new = NewAlert {
            message: message.to_string(),
            category,
            severity,
            network_id,
            session_id,
        };
        let id = self.store.record_alert(new.clone())?;
        warn!(alert = %id, %severity, %category, "{}", message);

        let mut state = self.lock();
        state.context.alert = Some(Alert::from_new(id, new, Utc::now()));
        let ticket = self.enter(&mut state, ConnectionState::Alerting);
        self.finish(state, ticket);
        Ok(id)
    }

    /// Marks the alert resolved and tells the plugins. The state is left
    /// alone.
    pub fn resolve_alert(&self, id: AlertId) -> Result<Alert> {
        let alert = self.store.resolve_alert(id)?;
        info!(alert = %id, "alert resolved");

        let mut state = self.lock();
        if let Some(current) = state.context.alert.as_mut() {
            if current.id == id {
                *current = alert.clone();
            }
        }
        let ticket = self.dispatcher.enqueue(LifecycleEvent::AlertResolved(alert.clone()));
        self.finish(state, Some(ticket));
        Ok(alert)
    }

    fn classify(&self, hw: &HwAddress, existing: Option<&NetworkIdentity>) -> Classification {
        if self.options.blacklisted.contains(hw) || existing.is_some_and(|network| network.blacklisted) {
            Classification::Blacklisted
        } else if self.options.home_network.as_ref() == Some(hw) {
            Classification::Home
        } else if existing.is_none() {
            Classification::New
        } else {
            Classification::Known
        }
    }

    fn is_monitored(&self, interface: &str) -> bool {
        let monitored = &self.options.monitored_interfaces;
        monitored.is_empty() || monitored.iter().any(|name| name == interface)
    }

    /// Assigns `next` and enqueues its broadcast. Must run under the state
    /// lock; returns the ticket of the last event enqueued.
    fn enter(&self, state: &mut MachineState, next: ConnectionState) -> Option<DeliveryTicket> {
        let previous = state.current;
        if previous == ConnectionState::ScanningInProgress {
            if let ReleaseOutcome::Abandoned(session) = state.barrier.release() {
                debug!(generation = session.generation, pending = ?session.pending(), "left scanning early");
            }
        }

        state.current = next;
        info!(from = %previous, to = %next, "state transition");

        if next != ConnectionState::ScanningInProgress {
            state.context.scan_generation = None;
            return Some(self.announce(state, next));
        }

        let expected = self.registry().scan_capable_enabled();
        match state.barrier.arm(&expected) {
            Ok(ArmOutcome::Armed { generation }) => {
                state.context.scan_generation = Some(generation);
                self.announce(state, next);

                let sink = self.sink();
                let starts = expected
                    .into_iter()
                    .map(|handle| {
                        let ticket = ScanTicket::new(handle.name, generation, state.context.clone(), sink.clone());
                        (handle.plugin, ticket)
                    })
                    .collect();
                Some(self.dispatcher.enqueue(LifecycleEvent::ScanStart(starts)))
            }
            Ok(ArmOutcome::Empty) => {
                self.announce(state, next);
                self.enter(state, ConnectionState::ScanCompleted)
            }
            Err(e) => {
                warn!("{}", e);
                Some(self.announce(state, next))
            }
        }
    }

    fn announce(&self, state: &MachineState, entered: ConnectionState) -> DeliveryTicket {
        self.dispatcher.enqueue(LifecycleEvent::Entered {
            state: entered,
            context: state.context.clone(),
        })
    }

    /// Releases the lock and waits for the broadcasts up to `ticket`.
    fn finish(&self, state: MutexGuard<'_, MachineState>, ticket: Option<DeliveryTicket>) -> ConnectionState {
        let current = state.current;
        drop(state);
        if let Some(ticket) = ticket {
            self.dispatcher.flush(ticket);
        }
        current
    }

    fn sink(&self) -> Weak<dyn CompletionSink> {
        self.this.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MachineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CompletionSink for ConnectionStateMachine {
    fn report_scan_complete(&self, generation: Option<u64>, name: &str) {
        let registry = self.registry().clone();
        let mut state = self.lock();
        let outcome = state.barrier.report(generation, name, |name| {
            registry
                .find(name)
                .map(|handle| {
                    let enabled = registry.is_enabled(&handle.name) == Some(true);
                    (handle.name, enabled)
                })
        });

        let ticket = match outcome {
            ReportOutcome::Satisfied { .. } if state.current == ConnectionState::ScanningInProgress => {
                self.enter(&mut state, ConnectionState::ScanCompleted)
            }
            ReportOutcome::Satisfied { generation } => {
                warn!(generation, state = %state.current, "scan satisfied outside scanning");
                state.barrier.release();
                None
            }
            ReportOutcome::Pending | ReportOutcome::Ignored => None,
        };
        self.finish(state, ticket);
    }
}

fn attach_context(identity: &NetworkIdentity, interface: Option<String>) -> StateContext {
    StateContext {
        hw_address: Some(identity.hw_address.clone()),
        network_name: Some(identity.name.clone()),
        network_id: Some(identity.id),
        interface,
        scan_generation: None,
        alert: None,
    }
}

fn detach(state: &mut MachineState) {
    state.connection = None;
    state.context = StateContext {
        interface: state.context.interface.take(),
        ..StateContext::default()
    };
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
