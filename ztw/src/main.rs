// External crates
use clap::Parser;
use tracing::debug;

// Internal imports
use ztw_core::ztw_error;

// Local modules
mod cli;
mod config;
mod workflow;

use cli::Args;

fn main() {
    // Tests expect clean output, so logging stays off in test mode
    if std::env::var("ZTW_TEST_MODE").is_err() {
        ztw_logging::init_subscriber();
    }

    let args = Args::parse();
    if args.debug {
        debug!(?args, "starting ztw workflow");
    }

    if let Err(e) = workflow::run(args) {
        ztw_error!("Error: {}", e);
        std::process::exit(1);
    }
}
