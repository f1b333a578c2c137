//! Known-issue store management commands.

use crate::config::ConfigProvider;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::Table;
use std::sync::Arc;
use triage_client::{HttpPatternStore, PatternStore};
use triage_protocol::IssueId;

#[derive(Subcommand)]
pub enum IssueCommand {
    /// List stored patterns in store order
    List(ListArgs),
    /// Store a new pattern
    Add(AddArgs),
    /// Delete a pattern by id
    Delete(DeleteArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// The regex pattern to store
    pub regex: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Id of the pattern to delete
    pub id: i64,
}

pub async fn run(command: IssueCommand, provider: Arc<dyn ConfigProvider>) -> Result<()> {
    let config = provider.load();
    let store = HttpPatternStore::new(&config.api_url);

    match command {
        IssueCommand::List(args) => {
            let issues = store.list().await.context("Failed to fetch issues")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&issues)?);
            } else {
                let mut table = Table::new();
                table.set_header(vec!["ID", "PATTERN"]);
                for issue in &issues {
                    table.add_row(vec![issue.id.to_string(), issue.regex_pattern.clone()]);
                }
                println!("{table}");
            }
        }
        IssueCommand::Add(args) => {
            let issue = store
                .create(&args.regex)
                .await
                .context("Failed to save issue")?;
            println!("Saved issue {} ({})", issue.id, issue.regex_pattern);
        }
        IssueCommand::Delete(args) => {
            let id = IssueId::new(args.id);
            store
                .delete(id)
                .await
                .with_context(|| format!("Failed to delete issue {id}"))?;
            println!("Deleted issue {id}");
        }
    }
    Ok(())
}
