use std::sync::OnceLock;

use mac_oui::Oui;
use netfang_common::network::mac::HwAddress;
use netfang_common::vendors::VendorRepository;
use tracing::warn;

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

/// Retrieves or initializes the **Organizationally unique identifier** database.
fn get_oui_db() -> Option<&'static Oui> {
    OUI_DB
        .get_or_init(|| match Oui::default() {
            Ok(db) => Some(db),
            Err(e) => {
                warn!("Failed to load OUI database: {}", e);
                None
            }
        })
        .as_ref()
}

pub struct MacOuiRepo;

impl VendorRepository for MacOuiRepo {
    fn get_vendor(&self, hw_address: &HwAddress) -> Option<String> {
        let db = get_oui_db()?;
        match db.lookup_by_mac(hw_address.as_str()) {
            Ok(Some(entry)) => Some(entry.company_name.clone()),
            _ => None,
        }
    }
}
