use clap::Parser;
use crosschart::cli::{run, Cli};
use crosschart::logging::init_logging;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}
