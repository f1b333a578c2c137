//! Reactive watch over a report snapshot file.
//!
//! The snapshot file stands in for the live document: whenever it is
//! rewritten (by a CI job, a report generator, or a manual edit), its
//! content is reloaded into the shared document as ordinary external
//! mutations, and the observer takes it from there.

use crate::actions::{NullPrompt, StderrNotifier};
use crate::config::ConfigProvider;
use crate::dom::{Document, DocumentHandle, NodeSnapshot};
use crate::orchestrator::Orchestrator;
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};
use triage_client::HttpPatternStore;

#[derive(Args)]
pub struct WatchArgs {
    /// Report snapshot file (JSON document tree)
    pub report: PathBuf,

    /// How often to check the snapshot file for changes, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub poll_ms: u64,
}

pub async fn run(args: WatchArgs, provider: Arc<dyn ConfigProvider>) -> Result<()> {
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

    orchestrator.start();
    info!(report = %args.report.display(), "Watching report");

    let mut last_modified = modified_at(&args.report);
    let mut ticker = tokio::time::interval(Duration::from_millis(args.poll_ms.max(100)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted; stopping watch");
                break;
            }
            _ = ticker.tick() => {
                let modified = modified_at(&args.report);
                if modified.is_some() && modified != last_modified {
                    last_modified = modified;
                    reload(&handle, &args.report);
                }
            }
        }
    }

    orchestrator.stop();
    Ok(())
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn reload(handle: &DocumentHandle, path: &Path) {
    let snapshot = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|text| serde_json::from_str::<NodeSnapshot>(&text).map_err(Into::into));
    match snapshot {
        Ok(snapshot) => {
            handle.lock().replace_content(&snapshot);
            info!(report = %path.display(), "Report reloaded");
        }
        Err(e) => {
            // Keep annotating the previous content; a half-written file
            // will be picked up on a later tick.
            warn!(report = %path.display(), error = %e, "Failed to reload report");
        }
    }
}
