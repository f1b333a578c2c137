//! Scan cycle orchestration and lifecycle.
//!
//! Single entry point sequencing config, pattern fetch, scanning,
//! classification, and reconciliation into one cycle, plus the
//! `start()`/`stop()` lifecycle that owns the change observer.

use crate::actions::{proposed_pattern, IssuePrompt, Notifier};
use crate::annotate;
use crate::config::{ConfigProvider, ScanSelectors};
use crate::dom::{DocumentHandle, NodeId};
use crate::matcher::classify;
use crate::observer::{ChangeObserver, ObserverConfig, ObserverHandle};
use crate::scanner::{resolve_error_text, scan_entries};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};
use triage_client::PatternStore;
use triage_protocol::defaults::{ACTION_ATTR, ROW_REF_ATTR};
use triage_protocol::ControlKind;

/// Result of one completed scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    /// Failure entries reconciled.
    pub entries: usize,
    /// Entries whose error text matched a stored pattern.
    pub matched: usize,
    /// Document writes performed (zero on a steady-state rescan).
    pub writes: usize,
}

/// Orchestrates the reactive match-and-annotate loop.
pub struct Orchestrator {
    doc: DocumentHandle,
    store: Arc<dyn PatternStore>,
    config: Arc<dyn ConfigProvider>,
    prompt: Arc<dyn IssuePrompt>,
    notifier: Arc<dyn Notifier>,
    observer_config: ObserverConfig,
    scan_in_progress: AtomicBool,
    observer: Mutex<Option<ObserverHandle>>,
}

impl Orchestrator {
    pub fn new(
        doc: DocumentHandle,
        store: Arc<dyn PatternStore>,
        config: Arc<dyn ConfigProvider>,
        prompt: Arc<dyn IssuePrompt>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        Arc::new(Self {
            doc,
            store,
            config,
            prompt,
            notifier,
            observer_config: ObserverConfig::default(),
            scan_in_progress: AtomicBool::new(false),
            observer: Mutex::new(None),
        })
    }

    /// Override observer timings (tests shrink them).
    pub fn with_observer_config(self: Arc<Self>, observer_config: ObserverConfig) -> Arc<Self> {
        // Sole-owner at construction time; Arc::try_unwrap keeps the
        // builder ergonomic without interior mutability on the field.
        match Arc::try_unwrap(self) {
            Ok(mut inner) => {
                inner.observer_config = observer_config;
                Arc::new(inner)
            }
            Err(shared) => {
                warn!("Observer config change ignored: orchestrator already shared");
                shared
            }
        }
    }

    pub fn document(&self) -> &DocumentHandle {
        &self.doc
    }

    /// Run one scan cycle. Returns None when a cycle is already in
    /// flight - overlapping invocations are dropped, not queued; the
    /// debounced trigger re-invokes after completion if still relevant.
    pub async fn run_scan(&self) -> Option<ScanSummary> {
        if self
            .scan_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Scan already in progress; dropping invocation");
            return None;
        }
        let _guard = ScanGuard(&self.scan_in_progress);

        let selectors = self.current_selectors();

        // A failed fetch degrades to the empty set: entries render as
        // report-eligible and badges clear, rather than blocking the loop.
        let issues = match self.store.list().await {
            Ok(issues) => issues,
            Err(e) => {
                warn!(error = %e, "Pattern fetch failed; treating set as empty");
                Vec::new()
            }
        };

        let mut doc = self.doc.lock();
        let mut summary = ScanSummary::default();

        let entries: Vec<_> = scan_entries(&doc, &selectors).collect();
        for entry in &entries {
            let matched = classify(&entry.error_text, &issues).is_some();
            if matched {
                summary.matched += 1;
            }
            if annotate::reconcile_entry(&mut doc, entry, matched) {
                summary.writes += 1;
            }
        }
        summary.entries = entries.len();

        // Badges are reconciled over every error container in the
        // document, not only those inside scanned rows: badge-bearing
        // containers can exist outside rows that carry controls.
        for error_node in doc.query_selector_all(&selectors.error) {
            let text = doc.text_excluding_marked(error_node);
            let matched = classify(text.trim(), &issues).is_some();
            if annotate::reconcile_badge(&mut doc, error_node, matched) {
                summary.writes += 1;
            }
        }

        info!(
            entries = summary.entries,
            matched = summary.matched,
            writes = summary.writes,
            "Scan complete"
        );
        Some(summary)
    }

    /// Start reactive observation. Idempotent: any prior observer and its
    /// poll are torn down before the new instance is installed, so at
    /// most one is ever active.
    pub fn start(self: &Arc<Self>) {
        let mut slot = self.observer_slot();
        if let Some(mut previous) = slot.take() {
            debug!("Replacing existing observer instance");
            previous.stop();
        }
        let mutations = self.doc.subscribe();
        let observer =
            ChangeObserver::new(self.doc.clone(), mutations, self.observer_config.clone());
        *slot = Some(observer.spawn(Arc::clone(self)));
        info!("Observer started");
    }

    /// Stop reactive observation. An in-flight scan runs to completion.
    pub fn stop(&self) {
        if let Some(mut handle) = self.observer_slot().take() {
            handle.stop();
            info!("Observer stopped");
        }
    }

    pub fn is_observing(&self) -> bool {
        self.observer_slot()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Route a clicked control to its workflow. The control names the
    /// workflow and its row through reserved attributes.
    pub async fn dispatch_action(&self, control: NodeId) {
        let resolved = {
            let doc = self.doc.lock();
            let kind = doc
                .attr(control, ACTION_ATTR)
                .and_then(|value| value.parse::<ControlKind>().ok());
            let row = doc
                .attr(control, ROW_REF_ATTR)
                .and_then(|value| value.parse::<NodeId>().ok())
                .filter(|&row| doc.is_attached(row));
            kind.zip(row)
        };
        let Some((kind, row)) = resolved else {
            warn!(%control, "Control is missing action routing; ignoring");
            return;
        };
        match kind {
            ControlKind::Report => self.request_report(row).await,
            ControlKind::Delete => self.request_delete(row).await,
        }
    }

    /// Report workflow: propose a literal pattern for the entry's error
    /// text, let the prompt collaborator edit it, then store it.
    pub async fn request_report(&self, row: NodeId) {
        let Some(error_text) = self.row_error_text(row) else {
            warn!(%row, "No error element for this row");
            return;
        };
        let proposed = proposed_pattern(&error_text);
        let Some(pattern) = self.prompt.prompt("Add Known Issue Regex", &proposed).await else {
            debug!(%row, "Report cancelled");
            return;
        };
        match self.store.create(&pattern).await {
            Ok(issue) => {
                info!(id = %issue.id, "Reported known issue");
                self.run_scan().await;
            }
            Err(e) => {
                self.notifier.notify(&format!("Failed to save issue: {e}"));
            }
        }
    }

    /// Delete workflow: re-resolve the matching pattern id at click time
    /// against a fresh fetch, then delete it. The document is only
    /// resynced on success.
    pub async fn request_delete(&self, row: NodeId) {
        let Some(error_text) = self.row_error_text(row) else {
            warn!(%row, "No error element for this row");
            return;
        };
        let issues = match self.store.list().await {
            Ok(issues) => issues,
            Err(e) => {
                self.notifier.notify(&format!("Failed to fetch issues: {e}"));
                return;
            }
        };
        let Some(matched) = classify(&error_text, &issues) else {
            warn!(%row, "No known issue matches this error text");
            return;
        };
        match self.store.delete(matched.id).await {
            Ok(()) => {
                info!(id = %matched.id, "Deleted known issue");
                self.run_scan().await;
            }
            Err(e) => {
                self.notifier
                    .notify(&format!("Failed to delete issue {}: {e}", matched.id));
            }
        }
    }

    fn row_error_text(&self, row: NodeId) -> Option<String> {
        let selectors = self.current_selectors();
        let doc = self.doc.lock();
        resolve_error_text(&doc, row, &selectors)
    }

    /// Load config and validate selectors, once per cycle. An invalid
    /// selector falls back to the built-in pair rather than blocking.
    fn current_selectors(&self) -> ScanSelectors {
        let config = self.config.load();
        match config.validate() {
            Ok(selectors) => selectors,
            Err(e) => {
                warn!(error = %e, "Invalid configured selector; using built-in selectors");
                ScanSelectors::built_in()
            }
        }
    }

    fn observer_slot(&self) -> std::sync::MutexGuard<'_, Option<ObserverHandle>> {
        self.observer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
