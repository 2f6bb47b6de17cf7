use colored::*;
use netfang_core::ConnectionStateMachine;

use crate::terminal::{colors, print};

pub fn list(machine: &ConnectionStateMachine) {
    for (idx, plugin) in machine.registry().descriptors().iter().enumerate() {
        print::tree_head(idx, &plugin.name);

        let status = if plugin.enabled {
            "enabled".color(colors::ENABLED)
        } else {
            "disabled".color(colors::DISABLED)
        };
        let mut details = vec![
            ("Status".to_string(), status),
            ("Scans".to_string(), plugin.scan_capable.to_string().normal()),
        ];
        if !plugin.dependencies.is_empty() {
            details.push(("Depends".to_string(), plugin.dependencies.join(", ").normal()));
        }
        print::as_tree_one_level(&details);
    }
    print::end_of_program();
}
