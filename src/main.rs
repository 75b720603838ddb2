use clap::Parser;
use dirplan::cli::{Cli, run};
use dirplan::logging::init_tracing;
use dirplan::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            OutputFormatter::error(&format!("{e:#}"));
            ExitCode::from(2)
        }
    }
}
