use std::fmt;
use std::str::FromStr;

use pnet::util::MacAddr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A hardware address in canonical form: uppercase hex, colon separated.
///
/// This is the unique key of a [`NetworkIdentity`](super::identity::NetworkIdentity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HwAddress(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hardware address: {0}")]
pub struct InvalidHwAddress(pub String);

impl HwAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_mac(&self) -> MacAddr {
        // Canonical form always round-trips.
        self.0.parse().unwrap_or_else(|_| MacAddr::zero())
    }
}

impl From<MacAddr> for HwAddress {
    fn from(mac: MacAddr) -> Self {
        Self(format!(
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            mac.0, mac.1, mac.2, mac.3, mac.4, mac.5
        ))
    }
}

impl FromStr for HwAddress {
    type Err = InvalidHwAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<MacAddr>()
            .map(HwAddress::from)
            .map_err(|_| InvalidHwAddress(s.to_string()))
    }
}

impl fmt::Display for HwAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for HwAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HwAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
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
