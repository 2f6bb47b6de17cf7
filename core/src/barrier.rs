//! # Scan Barrier
//!
//! All-of-N join over the scan-capable plugins expected in one scan
//! session. The barrier is plain data: it lives inside the state machine's
//! lock, which is what makes "the last report fires the completion" happen
//! at most once per generation.
//!
//! Phases: `Idle -> Armed -> Satisfied -> Idle`. Every session carries a
//! generation number so reports meant for an abandoned session are
//! recognised and dropped.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::notifier::ALL;
use crate::registry::PluginHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierPhase {
    Idle,
    Armed,
    Satisfied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedScan {
    pub name: String,
    pub reported: bool,
    /// Joined after arming by reporting without being expected.
    pub late: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanSession {
    pub generation: u64,
    pub expected: Vec<ExpectedScan>,
    pub armed_at: DateTime<Utc>,
}

impl ScanSession {
    pub fn is_satisfied(&self) -> bool {
        self.expected.iter().all(|entry| entry.reported)
    }

    pub fn pending(&self) -> Vec<&str> {
        self.expected
            .iter()
            .filter(|entry| !entry.reported)
            .map(|entry| entry.name.as_str())
            .collect()
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut ExpectedScan> {
        self.expected
            .iter_mut()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Nothing to wait for; the barrier stays idle.
    Empty,
    Armed { generation: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Stale generation, no live session, unknown or disabled plugin.
    Ignored,
    Pending,
    /// This report completed the session. Returned once per generation.
    Satisfied { generation: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseOutcome {
    Idle,
    Completed(ScanSession),
    Abandoned(ScanSession),
}

#[derive(Debug, thiserror::Error)]
#[error("scan barrier is already armed for generation {0}")]
pub struct AlreadyArmed(pub u64);

#[derive(Debug)]
pub struct ScanBarrier {
    phase: BarrierPhase,
    session: Option<ScanSession>,
    next_generation: u64,
}

impl Default for ScanBarrier {
    fn default() -> Self {
        Self {
            phase: BarrierPhase::Idle,
            session: None,
            next_generation: 1,
        }
    }
}

impl ScanBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> BarrierPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    pub fn generation(&self) -> Option<u64> {
        self.session.as_ref().map(|session| session.generation)
    }

    /// Takes `expected` as the session's expected set. The caller passes the
    /// registry snapshot it just copied; later toggles don't touch it.
    pub fn arm(&mut self, expected: &[PluginHandle]) -> Result<ArmOutcome, AlreadyArmed> {
        if let Some(session) = &self.session {
            return Err(AlreadyArmed(session.generation));
        }
        if expected.is_empty() {
            debug!("no scan-capable plugins enabled, nothing to wait for");
            return Ok(ArmOutcome::Empty);
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.session = Some(ScanSession {
            generation,
            expected: expected
                .iter()
                .map(|handle| ExpectedScan {
                    name: handle.name.clone(),
                    reported: false,
                    late: false,
                })
                .collect(),
            armed_at: Utc::now(),
        });
        self.phase = BarrierPhase::Armed;
        info!(generation, plugins = expected.len(), "scan barrier armed");
        Ok(ArmOutcome::Armed { generation })
    }

    /// Records one completion report.
    ///
    /// `generation` of `None` targets the live session. `is_enabled` is
    /// asked about plugins that report without being expected: enabled ones
    /// join the session as already reported, unknown or disabled ones are
    /// ignored.
    pub fn report(
        &mut self,
        generation: Option<u64>,
        name: &str,
        is_enabled: impl Fn(&str) -> Option<(String, bool)>,
    ) -> ReportOutcome {
        if self.phase != BarrierPhase::Armed {
            debug!(plugin = %name, "scan report with no armed session, ignoring");
            return ReportOutcome::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return ReportOutcome::Ignored;
        };
        if let Some(tagged) = generation {
            if tagged != session.generation {
                warn!(
                    plugin = %name,
                    generation = tagged,
                    live = session.generation,
                    "scan report for a stale generation, ignoring"
                );
                return ReportOutcome::Ignored;
            }
        }

        if name.eq_ignore_ascii_case(ALL) {
            for entry in &mut session.expected {
                entry.reported = true;
            }
        } else if let Some(entry) = session.entry_mut(name) {
            if entry.reported {
                debug!(plugin = %entry.name, "duplicate scan report");
            }
            entry.reported = true;
        } else {
            match is_enabled(name) {
                Some((canonical, true)) => {
                    info!(plugin = %canonical, "late scan participant joined the session");
                    session.expected.push(ExpectedScan {
                        name: canonical,
                        reported: true,
                        late: true,
                    });
                }
                Some((canonical, false)) => {
                    warn!(plugin = %canonical, "scan report from a disabled plugin, ignoring");
                    return ReportOutcome::Ignored;
                }
                None => {
                    warn!(plugin = %name, "scan report from an unknown plugin, ignoring");
                    return ReportOutcome::Ignored;
                }
            }
        }

        if session.is_satisfied() {
            self.phase = BarrierPhase::Satisfied;
            info!(generation = session.generation, "scan barrier satisfied");
            ReportOutcome::Satisfied {
                generation: session.generation,
            }
        } else {
            debug!(pending = ?session.pending(), "scan reports outstanding");
            ReportOutcome::Pending
        }
    }

    /// Clears the session. A satisfied session counts as completed, an armed
    /// one as abandoned.
    pub fn release(&mut self) -> ReleaseOutcome {
        let phase = std::mem::replace(&mut self.phase, BarrierPhase::Idle);
        match (phase, self.session.take()) {
            (BarrierPhase::Satisfied, Some(session)) => ReleaseOutcome::Completed(session),
            (_, Some(session)) => {
                info!(generation = session.generation, "scan session abandoned");
                ReleaseOutcome::Abandoned(session)
            }
            (_, None) => ReleaseOutcome::Idle,
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
