//! Shared fixtures for integration tests.
//!
//! Builds a full host around an in-memory document and collaborator
//! doubles, plus inspection helpers for annotation state.

#![allow(dead_code)]

use std::sync::Arc;
use triage::config::{MatcherConfig, StaticConfigProvider};
use triage::dom::{Document, DocumentHandle, NodeId};
use triage::orchestrator::Orchestrator;
use triage::scanner::{scan_entries, Entry};
use triage_protocol::defaults::{ACTIONS_CONTAINER_CLASS, ACTION_ATTR, BADGE_CLASS};
use triage_protocol::{ControlKind, KnownIssue};
use triage_test_utils::{MemoryPatternStore, RecordingNotifier, ScriptedPrompt};

pub struct TestHost {
    pub doc: DocumentHandle,
    pub store: Arc<MemoryPatternStore>,
    pub prompt: Arc<ScriptedPrompt>,
    pub notifier: Arc<RecordingNotifier>,
    pub orchestrator: Arc<Orchestrator>,
}

pub fn host(document: Document, issues: Vec<KnownIssue>) -> TestHost {
    host_with_prompt(document, issues, ScriptedPrompt::cancelling())
}

pub fn host_with_prompt(
    document: Document,
    issues: Vec<KnownIssue>,
    prompt: ScriptedPrompt,
) -> TestHost {
    let doc = DocumentHandle::new(document);
    let store = Arc::new(MemoryPatternStore::with_issues(issues));
    let prompt = Arc::new(prompt);
    let notifier = Arc::new(RecordingNotifier::new());
    let orchestrator = Orchestrator::new(
        doc.clone(),
        store.clone(),
        Arc::new(StaticConfigProvider(MatcherConfig::default())),
        prompt.clone(),
        notifier.clone(),
    );
    TestHost {
        doc,
        store,
        prompt,
        notifier,
        orchestrator,
    }
}

/// Current failure entries, scanned fresh with the default selectors.
pub fn entries(host: &TestHost) -> Vec<Entry> {
    let selectors = MatcherConfig::default()
        .validate()
        .expect("default selectors parse");
    let doc = host.doc.lock();
    scan_entries(&doc, &selectors).collect()
}

/// The action control node for a row, if its container holds exactly one.
pub fn control_node(host: &TestHost, row: NodeId) -> Option<NodeId> {
    let doc = host.doc.lock();
    let container = doc.child_with_class(doc.parent(row)?, ACTIONS_CONTAINER_CLASS)?;
    let children = doc.children(container);
    if children.len() == 1 {
        Some(children[0])
    } else {
        None
    }
}

/// Number of controls currently attached for a row.
pub fn control_count(host: &TestHost, row: NodeId) -> usize {
    let doc = host.doc.lock();
    let Some(parent) = doc.parent(row) else {
        return 0;
    };
    match doc.child_with_class(parent, ACTIONS_CONTAINER_CLASS) {
        Some(container) => doc.children(container).len(),
        None => 0,
    }
}

pub fn control_kind(host: &TestHost, row: NodeId) -> Option<ControlKind> {
    let node = control_node(host, row)?;
    let doc = host.doc.lock();
    doc.attr(node, ACTION_ATTR)?.parse().ok()
}

pub fn badge_present(host: &TestHost, error_node: NodeId) -> bool {
    let doc = host.doc.lock();
    doc.child_with_class(error_node, BADGE_CLASS).is_some()
}

pub fn attached_count(host: &TestHost) -> usize {
    host.doc.lock().attached_count()
}
