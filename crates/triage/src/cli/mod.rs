//! Command-line interface for the `triage` binary.

pub mod issue;
pub mod scan;
pub mod watch;

use crate::config::{ConfigProvider, FileConfigProvider};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "triage",
    version,
    about = "Known-issue matching for live failure reports"
)]
pub struct Cli {
    /// Verbose console logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: ~/.triage/config.toml)
    #[arg(long, global = true, env = "TRIAGE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Annotate a report snapshot once and print the result
    Scan(scan::ScanArgs),
    /// Watch a report snapshot and keep annotations synchronized
    Watch(watch::WatchArgs),
    /// Manage stored known-issue patterns
    #[command(subcommand)]
    Issue(issue::IssueCommand),
}

pub async fn run(cli: Cli) -> Result<()> {
    let provider: Arc<dyn ConfigProvider> = match &cli.config {
        Some(path) => Arc::new(FileConfigProvider::new(path)),
        None => Arc::new(FileConfigProvider::default_location()),
    };

    match cli.command {
        Command::Scan(args) => scan::run(args, provider).await,
        Command::Watch(args) => watch::run(args, provider).await,
        Command::Issue(command) => issue::run(command, provider).await,
    }
}
