mod commands;
mod terminal;

use commands::{CommandLine, Commands, bootstrap, networks, plugins, run, simulate};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose)?;
    print::banner();

    let config = bootstrap::load_config(&commands.config)?;

    match commands.command {
        Commands::Run => {
            print::header("starting orchestrator");
            let machine = bootstrap::build(&config)?;
            run::run(machine, &config).await
        }
        Commands::Simulate { hw_address, name, wait } => {
            print::header("simulating connection");
            let machine = bootstrap::build(&config)?;
            simulate::simulate(machine, hw_address, name.join(" "), wait).await
        }
        Commands::Plugins => {
            print::header("plugins");
            let machine = bootstrap::build(&config)?;
            plugins::list(&machine);
            Ok(())
        }
        Commands::Networks => {
            print::header("networks");
            let store = bootstrap::open_store(&config)?;
            networks::list(store.as_ref())
        }
    }
}
