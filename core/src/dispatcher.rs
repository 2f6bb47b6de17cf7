//! # Event Dispatcher
//!
//! Lifecycle broadcasts go through one FIFO queue. Transitions enqueue
//! their events while they still hold the state lock, so queue order is
//! transition order. Delivery happens outside that lock: whichever thread
//! flushes first becomes the drainer and delivers everything queued, the
//! others wait until their own events are out.
//!
//! A thread that is already draining and flushes again (a plugin hook
//! requesting a transition) returns at once. Its events sit behind the
//! ones currently being delivered and go out right after them.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use netfang_common::alert::Alert;
use netfang_common::state::ConnectionState;
use tracing::{debug, error, warn};

use crate::notifier::ScanTicket;
use crate::plugin::{Plugin, StateContext};
use crate::registry::{self, PluginRegistry};

/// Position of an event in the queue, returned by [`EventDispatcher::enqueue`].
pub type DeliveryTicket = u64;

pub enum LifecycleEvent {
    /// The machine entered `state`.
    Entered {
        state: ConnectionState,
        context: StateContext,
    },
    /// Scan-start signals for the expected set of one session.
    ScanStart(Vec<(Arc<dyn Plugin>, ScanTicket)>),
    AlertResolved(Alert),
}

#[derive(Default)]
struct Queue {
    pending: VecDeque<(u64, LifecycleEvent)>,
    next_seq: u64,
    /// Every event with a lower sequence number has been delivered.
    delivered: u64,
    drainer: Option<ThreadId>,
}

pub struct EventDispatcher {
    registry: Arc<PluginRegistry>,
    queue: Mutex<Queue>,
    drained: Condvar,
}

impl EventDispatcher {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            queue: Mutex::new(Queue::default()),
            drained: Condvar::new(),
        }
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn enqueue(&self, event: LifecycleEvent) -> DeliveryTicket {
        let mut queue = self.lock();
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.pending.push_back((seq, event));
        seq
    }

    /// Blocks until the event behind `ticket` has been delivered, draining
    /// the queue on this thread if nobody else is.
    pub fn flush(&self, ticket: DeliveryTicket) {
        let me = thread::current().id();
        let mut queue = self.lock();

        loop {
            if queue.delivered > ticket {
                return;
            }
            match queue.drainer {
                Some(id) if id == me => return,
                Some(_) => {
                    queue = self
                        .drained
                        .wait(queue)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => break,
            }
        }

        queue.drainer = Some(me);
        while let Some((seq, event)) = queue.pending.pop_front() {
            drop(queue);
            self.deliver(event);
            queue = self.lock();
            queue.delivered = seq + 1;
            self.drained.notify_all();
        }
        queue.drainer = None;
        self.drained.notify_all();
    }

    /// Enqueue and flush in one go.
    pub fn broadcast(&self, event: LifecycleEvent) {
        let ticket = self.enqueue(event);
        self.flush(ticket);
    }

    fn deliver(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Entered { state, context } => {
                debug!(state = %state, "broadcasting {}", state.callback_name());
                self.registry.dispatch(state, &context);
            }
            LifecycleEvent::ScanStart(expected) => {
                for (plugin, ticket) in expected {
                    start_scan(plugin.as_ref(), ticket);
                }
            }
            LifecycleEvent::AlertResolved(alert) => {
                for handle in self.registry.enabled() {
                    registry::guarded(&handle.name, "on_alert_resolved", || {
                        handle.plugin.on_alert_resolved(&alert)
                    });
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A scan-start hook that fails or panics counts as that plugin's report,
/// otherwise the session would wait on a scan that never ran.
fn start_scan(plugin: &dyn Plugin, ticket: ScanTicket) {
    let fallback = ticket.clone();
    match catch_unwind(AssertUnwindSafe(|| plugin.start_scan(ticket))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(plugin = %plugin.name(), "scan start failed, counting it as done: {}", e);
            fallback.complete();
        }
        Err(_) => {
            error!(plugin = %plugin.name(), "scan start panicked, counting it as done");
            fallback.complete();
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
