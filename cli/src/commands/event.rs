//! # Event Lines
//!
//! The line protocol read by `netfang run`. One event per line, first word
//! is the verb:
//!
//! * `cable IFACE`, `connect HW [NAME...]`, `disconnect`
//! * `done PLUGIN|all`
//! * `enable NAME`, `disable NAME`, `action PLUGIN ARGS...`
//! * `force STATE`, `alert MESSAGE...`, `resolve ID`, `state`

use std::str::FromStr;

use netfang_common::alert::AlertId;
use netfang_common::state::ConnectionState;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Cable(String),
    Connect { hw_address: String, name: String },
    Disconnect,
    Done(String),
    Enable(String),
    Disable(String),
    Action(Vec<String>),
    Force(ConnectionState),
    Alert(String),
    Resolve(AlertId),
    State,
}

impl FromStr for Event {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| "empty event".to_string())?
            .to_ascii_lowercase();
        let rest: Vec<String> = words.map(str::to_string).collect();

        let single = |what: &str| -> Result<String, String> {
            match rest.as_slice() {
                [one] => Ok(one.clone()),
                _ => Err(format!("'{verb}' expects exactly one {what}")),
            }
        };

        match verb.as_str() {
            "cable" => single("interface").map(Event::Cable),
            "connect" => {
                let (hw_address, name) = rest
                    .split_first()
                    .ok_or_else(|| "'connect' expects a hardware address".to_string())?;
                Ok(Event::Connect {
                    hw_address: hw_address.clone(),
                    name: name.join(" "),
                })
            }
            "disconnect" => Ok(Event::Disconnect),
            "done" => single("plugin name").map(Event::Done),
            "enable" => single("plugin name").map(Event::Enable),
            "disable" => single("plugin name").map(Event::Disable),
            "action" if !rest.is_empty() => Ok(Event::Action(rest)),
            "action" => Err("'action' expects a plugin name".to_string()),
            "force" => single("state")?.parse().map(Event::Force),
            "alert" if !rest.is_empty() => Ok(Event::Alert(rest.join(" "))),
            "alert" => Err("'alert' expects a message".to_string()),
            "resolve" => single("alert id")?
                .parse()
                .map(|id| Event::Resolve(AlertId(id)))
                .map_err(|_| "alert ids are numbers".to_string()),
            "state" => Ok(Event::State),
            other => Err(format!("unknown event '{other}'")),
        }
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
