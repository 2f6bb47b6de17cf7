pub mod bootstrap;
pub mod event;
pub mod networks;
pub mod plugins;
pub mod run;
pub mod simulate;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "netfang")]
#[command(about = "Follows a drop box from network to network and runs scans on each.")]
pub struct CommandLine {
    /// Path to the JSON configuration
    #[arg(short, long, global = true, default_value = "config.json")]
    pub config: PathBuf,

    /// Raise log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the orchestrator, reading events from stdin
    #[command(alias = "r")]
    Run,
    /// Feed a single connection event and wait for the scan to settle
    #[command(alias = "s")]
    Simulate {
        hw_address: String,
        #[arg(num_args = 1.., required = true)]
        name: Vec<String>,
        /// Seconds to wait for scans before giving up
        #[arg(long, default_value_t = 60)]
        wait: u64,
    },
    /// List loaded plugins
    #[command(alias = "p")]
    Plugins,
    /// List known networks and alerts
    #[command(alias = "n")]
    Networks,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
