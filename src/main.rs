//! # Panorama Entry Point
//!
//! Parses the command line and calls into the library's `run()`.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info panorama world.json --min -2,-1,-2 --max 2,1,2 --workers 8
//! ```

use std::process::ExitCode;

use clap::Parser;
use log::error;

use panorama::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    panorama::init_logging();

    match panorama::run(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
