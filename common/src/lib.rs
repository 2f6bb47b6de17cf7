//! # Netfang Common
//!
//! Plain data shared by every netfang crate: the connection states, the
//! identity of a network, alerts, plugin dependency references and the
//! configuration model. Nothing in here holds a lock or spawns a thread.

pub mod alert;
pub mod config;
pub mod dependency;
pub mod network;
pub mod state;
pub mod vendors;
