use async_trait::async_trait;
use netfang_common::network::interface::{self, LinkStatus};
use sysinfo::{ComponentExt, System, SystemExt};
use tracing::debug;

use super::Condition;

/// True while any temperature sensor reads above the threshold.
pub struct CpuTemperatureAbove {
    threshold: f32,
}

impl CpuTemperatureAbove {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

#[async_trait]
impl Condition for CpuTemperatureAbove {
    async fn check(&self) -> bool {
        let threshold = self.threshold;
        let hottest = tokio::task::spawn_blocking(|| {
            let mut system = System::new();
            system.refresh_components_list();
            system
                .components()
                .iter()
                .map(|component| component.temperature())
                .fold(None, |hottest: Option<f32>, t| Some(hottest.map_or(t, |h| h.max(t))))
        })
        .await
        .ok()
        .flatten();

        match hottest {
            Some(celsius) => {
                debug!(celsius, threshold, "temperature sample");
                celsius > threshold
            }
            None => false,
        }
    }
}

/// True while the interface is missing, down or without carrier.
pub struct InterfaceUnplugged {
    interface: String,
}

impl InterfaceUnplugged {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

#[async_trait]
impl Condition for InterfaceUnplugged {
    async fn check(&self) -> bool {
        let status = interface::current_link_status(&self.interface);
        if status != LinkStatus::Up {
            debug!(interface = %self.interface, ?status, "link not up");
        }
        !status.is_up()
    }
}
