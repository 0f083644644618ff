//! Fillcheck - bottle fill level and plate consumption from photos
//!
//! A CLI tool that measures remaining liquid in bottles and estimates how
//! much of a served dish was eaten.

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use cli::Cli;
use env_logger::{Builder, Env};
use log::LevelFilter;

fn init_logging(verbose: bool) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
