use colored::*;
use netfang_core::store::NetworkStore;

use crate::terminal::{colors, print};

pub fn list(store: &dyn NetworkStore) -> anyhow::Result<()> {
    let networks = store.networks()?;
    if networks.is_empty() {
        print::print_status("no networks on record");
    }

    for (idx, network) in networks.iter().enumerate() {
        print::tree_head(idx, &network.name);

        let mut details = vec![
            ("MAC".to_string(), network.hw_address.as_str().color(colors::HW_ADDR)),
            ("Vendor".to_string(), network.vendor.as_deref().unwrap_or("unknown").normal()),
            ("Seen".to_string(), network.last_seen.format("%Y-%m-%d %H:%M").to_string().normal()),
        ];
        if network.home {
            details.push(("Flags".to_string(), "home".green()));
        } else if network.blacklisted {
            details.push(("Flags".to_string(), "blacklisted".red().bold()));
        }
        print::as_tree_one_level(&details);
    }

    let alerts = store.alerts()?;
    if !alerts.is_empty() {
        print::header("alerts");
    }
    for alert in &alerts {
        let state = if alert.resolved { "resolved".dimmed() } else { "open".yellow().bold() };
        print::print_status(format!(
            "#{} [{}] {} {}: {}",
            alert.id, state, alert.severity, alert.category, alert.message
        ));
    }

    print::end_of_program();
    Ok(())
}
