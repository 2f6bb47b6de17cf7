use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::identity::NetworkId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlertId(pub u64);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    System,
    Network,
    Security,
    Hardware,
    Plugin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// An alert as handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub message: String,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub network_id: Option<NetworkId>,
    /// Scan generation live when the alert was raised.
    pub session_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub message: String,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub network_id: Option<NetworkId>,
    pub session_id: Option<u64>,
}

impl Alert {
    pub fn from_new(id: AlertId, new: NewAlert, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            message: new.message,
            category: new.category,
            severity: new.severity,
            created_at,
            resolved: false,
            resolved_at: None,
            network_id: new.network_id,
            session_id: new.session_id,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Error => "error",
            AlertSeverity::Critical => "critical",
        };
        f.write_str(label)
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlertCategory::System => "system",
            AlertCategory::Network => "network",
            AlertCategory::Security => "security",
            AlertCategory::Hardware => "hardware",
            AlertCategory::Plugin => "plugin",
        };
        f.write_str(label)
    }
}
