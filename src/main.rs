//! revpub - Content-addressed asset publisher for static web clients.

mod cli;
mod config;
mod logger;
mod publish;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PublishConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = PublishConfig::load(&cli)?;

    match &cli.command {
        Commands::Publish { args } => {
            cli::publish::publish_assets(&config, args.quiet).map(|_| ())
        }
        Commands::Verify { verbose } => cli::verify::verify_publish(&config, *verbose),
    }
}
