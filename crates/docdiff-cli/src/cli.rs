use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docdiff",
    about = "Structural diff of tree-shaped documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Diff two JSON documents
    Diff(DiffArgs),
    /// Parse a JSON document and report its structure
    Check(CheckArgs),
    /// Print the effective diff configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    /// Old revision
    pub old: PathBuf,
    /// New revision
    pub new: PathBuf,
    /// TOML file with diff settings
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Overall content diff budget in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Diff only this top-level child of the old document
    #[arg(long)]
    pub old_child: Option<usize>,
    /// Diff only this top-level child of the new document
    #[arg(long)]
    pub new_child: Option<usize>,
}

#[derive(Args)]
pub struct CheckArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
}
