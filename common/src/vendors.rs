use crate::network::mac::HwAddress;

/// Defines the contract for resolving device manufacturers from hardware addresses.
pub trait VendorRepository: Send + Sync {
    /// Retrieves the vendor name for a given hardware address.
    ///
    /// # Returns
    /// * `Some(String)` - The name of the vendor if found.
    /// * `None` - If the OUI is unknown.
    fn get_vendor(&self, hw_address: &HwAddress) -> Option<String>;
}
