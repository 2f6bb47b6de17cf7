//! # Alert Triggers
//!
//! Conditions polled on an interval. A trigger raises its alert through the
//! state machine when its condition turns true, and arms again only once the
//! condition has read false. A condition that stays true raises one alert.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use netfang_common::alert::{AlertCategory, AlertSeverity};
use netfang_common::config::TriggerConfig;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::machine::ConnectionStateMachine;

mod conditions;

pub use conditions::{CpuTemperatureAbove, InterfaceUnplugged};

#[async_trait]
pub trait Condition: Send + Sync {
    async fn check(&self) -> bool;
}

/// What gets recorded when a trigger fires.
#[derive(Debug, Clone)]
pub struct AlertTemplate {
    pub message: String,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
}

pub struct Trigger {
    pub name: String,
    condition: Box<dyn Condition>,
    alert: AlertTemplate,
    active: bool,
}

impl Trigger {
    pub fn new(name: impl Into<String>, condition: Box<dyn Condition>, alert: AlertTemplate) -> Self {
        Self {
            name: name.into(),
            condition,
            alert,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[derive(Default)]
pub struct TriggerManager {
    triggers: Vec<Trigger>,
}

impl TriggerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in triggers switched on in `config`.
    pub fn from_config(config: &TriggerConfig, interfaces: &[String]) -> Self {
        let mut manager = Self::new();

        if let Some(threshold) = config.cpu_temp_threshold {
            manager.add(Trigger::new(
                "cpu_temperature",
                Box::new(CpuTemperatureAbove::new(threshold)),
                AlertTemplate {
                    message: format!("CPU temperature above {threshold:.1}°C"),
                    category: AlertCategory::Hardware,
                    severity: AlertSeverity::Warning,
                },
            ));
        }

        if config.interface_unplugged {
            for interface in interfaces {
                manager.add(Trigger::new(
                    format!("{interface}_unplugged"),
                    Box::new(InterfaceUnplugged::new(interface.clone())),
                    AlertTemplate {
                        message: format!("interface {interface} lost its link"),
                        category: AlertCategory::Network,
                        severity: AlertSeverity::Error,
                    },
                ));
            }
        }

        manager
    }

    pub fn add(&mut self, trigger: Trigger) {
        self.triggers.push(trigger);
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Checks every trigger once. Returns how many alerts were raised.
    pub async fn check_triggers(&mut self, machine: &Arc<ConnectionStateMachine>) -> usize {
        let mut raised = 0;

        for trigger in &mut self.triggers {
            let tripped = trigger.condition.check().await;
            if !tripped {
                if trigger.active {
                    debug!(trigger = %trigger.name, "trigger re-armed");
                }
                trigger.active = false;
                continue;
            }
            if trigger.active {
                continue;
            }

            trigger.active = true;
            info!(trigger = %trigger.name, "trigger fired");

            let machine = machine.clone();
            let alert = trigger.alert.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                machine.raise_alert(&alert.message, alert.category, alert.severity)
            })
            .await;

            match outcome {
                Ok(Ok(_)) => raised += 1,
                Ok(Err(e)) => error!(trigger = %trigger.name, "failed to raise alert: {}", e),
                Err(e) => error!(trigger = %trigger.name, "alert task failed: {}", e),
            }
        }

        raised
    }

    /// Polls every `interval` until `shutdown` reads true.
    pub async fn run(
        mut self,
        machine: Arc<ConnectionStateMachine>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        if self.is_empty() {
            return;
        }

        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_triggers(&machine).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("trigger loop stopping");
                        return;
                    }
                }
            }
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
