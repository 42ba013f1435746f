//! cmerge - carries live configuration values into a marked config file
//!
//! The value file (by default `Web.config`) is looked up next to the marked
//! file, merged into it, backed up and replaced by the result.

use std::process::ExitCode;

use clap::Parser;

mod cli;
mod run;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
