use std::process::ExitCode;

use clap::Parser;
use env_logger::init;
use font_calt_merger_cli::{cli::Cli, status::exit_status};

fn main() -> ExitCode {
    init();
    match Cli::parse().command.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(exit_status(&e))
        }
    }
}
