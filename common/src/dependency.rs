//! Declarative pointers from one plugin's enable step to another plugin's
//! setup action.

use std::fmt;
use std::str::FromStr;

const LONG_FORM_PREFIX: [&str; 2] = ["netfang", "plugins"];

/// `plugin.action`, or the long form `netfang.plugins.plugin.action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    pub plugin: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed dependency reference '{0}': expected 'plugin.action'")]
pub struct MalformedDependency(pub String);

impl FromStr for DependencyRef {
    type Err = MalformedDependency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        let (plugin, action) = match parts.as_slice() {
            [plugin, action] => (*plugin, *action),
            [a, b, plugin, action] if [*a, *b] == LONG_FORM_PREFIX => (*plugin, *action),
            _ => return Err(MalformedDependency(s.to_string())),
        };

        if plugin.is_empty() || action.is_empty() {
            return Err(MalformedDependency(s.to_string()));
        }

        Ok(Self {
            plugin: plugin.to_string(),
            action: action.to_string(),
        })
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.plugin, self.action)
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
