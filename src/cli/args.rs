//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Content-addressed asset publisher
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: search upward for revpub.toml)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fingerprint, repair and compress the built asset tree
    #[command(visible_alias = "p")]
    Publish {
        #[command(flatten)]
        args: PublishArgs,
    },

    /// Check a previous publish against its manifest
    #[command(visible_alias = "v")]
    Verify {
        /// Enable verbose output for debugging
        #[arg(short = 'V', long)]
        verbose: bool,
    },
}

/// Publish command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct PublishArgs {
    /// Destination host the assets are served from (e.g. cdn.example.com)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Glob for assets copied without renaming (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Root of the built asset tree (relative to cwd)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Publish root receiving fingerprinted files (relative to cwd)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Manifest location (relative to cwd)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub manifest: Option<PathBuf>,

    /// Skip writing compressed siblings
    #[arg(long)]
    pub no_compress: bool,

    /// Only print the final summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}
