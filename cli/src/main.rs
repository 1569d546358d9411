mod commands;
mod terminal;

use commands::{CommandLine, Commands, scan};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose, commands.quiet);

    match commands.command {
        Commands::Scan(args) => {
            print::header("starting scanner");
            scan::scan(args).await
        }
    }
}
