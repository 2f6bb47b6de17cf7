use netfang_common::config::ConfigError;
use netfang_common::network::mac::HwAddress;

use crate::store::StoreError;

/// Errors that escalate to callers of the public API.
///
/// Plugin-side anomalies never show up here: they are logged and contained
/// by the dispatcher, the registry and the scan barrier.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error")]
    Configuration(#[from] ConfigError),
    #[error("plugin '{0}' not found")]
    PluginNotFound(String),
    #[error("could not classify network {hw_address}")]
    Classification {
        hw_address: HwAddress,
        #[source]
        source: StoreError,
    },
    #[error("store operation failed")]
    Store(#[from] StoreError),
    #[error("invalid hardware address '{0}'")]
    InvalidHardwareAddress(String),
}

pub type Result<T> = std::result::Result<T, Error>;
