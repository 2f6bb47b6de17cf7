pub mod device;
pub mod identity;
pub mod interface;
pub mod mac;
