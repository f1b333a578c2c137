//! One-shot scan over a report snapshot.

use crate::actions::{NullPrompt, StderrNotifier};
use crate::config::ConfigProvider;
use crate::dom::{Document, DocumentHandle};
use crate::orchestrator::Orchestrator;
use crate::scanner::scan_entries;
use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Table;
use std::path::PathBuf;
use std::sync::Arc;
use triage_client::HttpPatternStore;
use triage_protocol::defaults::BADGE_CLASS;

#[derive(Args)]
pub struct ScanArgs {
    /// Report snapshot file (JSON document tree)
    pub report: PathBuf,

    /// Print the annotated snapshot as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ScanArgs, provider: Arc<dyn ConfigProvider>) -> Result<()> {
    let json_text = std::fs::read_to_string(&args.report)
        .with_context(|| format!("Failed to read report: {}", args.report.display()))?;
    let location = format!("file://{}", args.report.display());
    let document = Document::load_json(location, &json_text)
        .with_context(|| format!("Failed to parse report: {}", args.report.display()))?;
    let handle = DocumentHandle::new(document);

    let config = provider.load();
    let store = Arc::new(HttpPatternStore::new(&config.api_url));
    let orchestrator = Orchestrator::new(
        handle.clone(),
        store,
        provider,
        Arc::new(NullPrompt),
        Arc::new(StderrNotifier),
    );

    let summary = orchestrator
        .run_scan()
        .await
        .context("Scan was dropped - another scan in flight")?;

    if args.json {
        let doc = handle.lock();
        println!("{}", serde_json::to_string_pretty(&doc.to_snapshot())?);
        return Ok(());
    }

    let selectors = config.validate().unwrap_or_else(|_| {
        crate::config::ScanSelectors::built_in()
    });
    let doc = handle.lock();
    let mut table = Table::new();
    table.set_header(vec!["ROW", "ERROR", "STATUS"]);
    for entry in scan_entries(&doc, &selectors) {
        let row_text = doc.text_content(entry.row);
        let known = doc.child_with_class(entry.error_node, BADGE_CLASS).is_some();
        table.add_row(vec![
            truncate(row_text.trim(), 40),
            truncate(&entry.error_text, 60),
            if known { "KNOWN ISSUE" } else { "NEW" }.to_string(),
        ]);
    }
    println!("{table}");
    println!(
        "{} entries, {} known, {} writes",
        summary.entries, summary.matched, summary.writes
    );
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
