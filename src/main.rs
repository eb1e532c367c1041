//! restless-swagger - command-line tool for documenting auto-generated REST APIs.
//!
//! Reads a model manifest, registers every model it marks for exposure, and
//! either writes the resulting Swagger 2.0 document or serves it over HTTP.
//!
//! # Usage
//!
//! ```bash
//! restless-swagger generate models.yaml -o swagger.json
//! restless-swagger generate models.yaml -f yaml --tests-dir tests
//! restless-swagger serve models.yaml --addr 0.0.0.0:5000
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use restless_swagger::cli;

fn main() -> Result<()> {
    // Parse first so the verbose flag can pick the log level
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("restless-swagger starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("Done");

    Ok(())
}
