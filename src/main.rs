//! Windsmith command-line entry point.

use std::{error::Error, process};

use clap::Parser;
use tracing::{Level, debug, span};
use windsmith::{
    cli::{self, Cli, formatting::format_error},
    tracing_config,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    match &args.log_dir {
        Some(dir) => tracing_config::init_with_file(dir)?,
        None => tracing_config::init()?,
    }

    let _span = span!(Level::INFO, "windsmith").entered();
    debug!(command = ?args.command, "Starting");

    if let Err(err) = cli::run(args.command).await {
        eprintln!("{}: {err}", format_error("error"));
        process::exit(1);
    }

    Ok(())
}
