mod cli;
mod execute;

use std::process::ExitCode;
use clap::Parser;
use colored::Colorize;
use setup_steamcmd::init_tracing;
use crate::cli::CLI;

fn main() -> ExitCode {
    let cli = CLI::parse();
    let runner_debug = std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1");
    init_tracing(cli.verbose || runner_debug);
    match execute::execute(cli, runner_debug) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
