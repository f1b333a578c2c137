use anyhow::Result;
use clap::Parser;
use triage::cli::{self, Cli};
use triage_logging::{init_logging, LogConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogConfig {
        app_name: "triage",
        verbose: cli.verbose,
    })?;
    cli::run(cli).await
}
