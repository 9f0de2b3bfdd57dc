use anyhow::Result;
use clap::Parser;

use linework::cli::Cli;
use linework::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    commands::simplify(&cli)
}
