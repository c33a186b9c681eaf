// Entrypoint for the `alice` binary.
// - Keeps `main` small: parse arguments, install logging and the interrupt
//   handler, hand off to the dispatcher, and turn its exit code into the
//   process status.

use clap::Parser;
use std::process::ExitCode;
use tracing::warn;

use alice_sdk::{cleanup, cli::Cli, commands, logging};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = cleanup::install() {
        warn!(error = %format!("{err:#}"), "temporary archives will not be removed on Ctrl-C");
    }
    ExitCode::from(commands::run(cli))
}
