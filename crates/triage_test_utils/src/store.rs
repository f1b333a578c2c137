//! Collaborator doubles: pattern store, prompt, and notifier.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use triage::actions::{IssuePrompt, Notifier};
use triage_client::{PatternStore, Result, StoreError};
use triage_protocol::{IssueId, KnownIssue};

fn scripted_failure() -> StoreError {
    StoreError::Status {
        status: 500,
        body: "scripted failure".to_string(),
    }
}

/// In-memory [`PatternStore`] with scriptable failures and call counters.
#[derive(Default)]
pub struct MemoryPatternStore {
    issues: Mutex<Vec<KnownIssue>>,
    next_id: AtomicI64,
    fail_list: AtomicBool,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    list_calls: AtomicUsize,
}

impl MemoryPatternStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn with_issues(issues: Vec<KnownIssue>) -> Self {
        let next = issues.iter().map(|i| i.id.as_i64()).max().unwrap_or(0) + 1;
        let store = Self::new();
        store.next_id.store(next, Ordering::SeqCst);
        *store.issues.lock().unwrap() = issues;
        store
    }

    pub fn issues(&self) -> Vec<KnownIssue> {
        self.issues.lock().unwrap().clone()
    }

    /// Number of `list()` calls so far. Each completed scan fetches
    /// exactly once, so this counts scans.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PatternStore for MemoryPatternStore {
    async fn list(&self) -> Result<Vec<KnownIssue>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(scripted_failure());
        }
        Ok(self.issues())
    }

    async fn create(&self, regex: &str) -> Result<KnownIssue> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(scripted_failure());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let issue = KnownIssue::new(id, regex);
        self.issues.lock().unwrap().push(issue.clone());
        Ok(issue)
    }

    async fn delete(&self, id: IssueId) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(scripted_failure());
        }
        let mut issues = self.issues.lock().unwrap();
        let before = issues.len();
        issues.retain(|issue| issue.id != id);
        if issues.len() == before {
            return Err(StoreError::Status {
                status: 404,
                body: format!("no issue {id}"),
            });
        }
        Ok(())
    }
}

/// One scripted answer for [`ScriptedPrompt`].
#[derive(Debug, Clone)]
pub enum PromptResponse {
    /// Submit this exact string.
    Submit(String),
    /// Submit whatever default the workflow proposed.
    AcceptDefault,
    /// Cancel the workflow.
    Cancel,
}

/// Prompt double that replays scripted responses in order. An exhausted
/// script cancels.
#[derive(Default)]
pub struct ScriptedPrompt {
    responses: Mutex<VecDeque<PromptResponse>>,
    seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedPrompt {
    pub fn new(responses: impl IntoIterator<Item = PromptResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Prompt that submits the given value once.
    pub fn submitting(value: &str) -> Self {
        Self::new([PromptResponse::Submit(value.to_string())])
    }

    /// Prompt that accepts the proposed default once.
    pub fn accepting_default() -> Self {
        Self::new([PromptResponse::AcceptDefault])
    }

    /// Prompt that always cancels.
    pub fn cancelling() -> Self {
        Self::default()
    }

    /// `(title, default_value)` pairs the workflow showed, in order.
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssuePrompt for ScriptedPrompt {
    async fn prompt(&self, title: &str, default_value: &str) -> Option<String> {
        self.seen
            .lock()
            .unwrap()
            .push((title.to_string(), default_value.to_string()));
        match self.responses.lock().unwrap().pop_front() {
            Some(PromptResponse::Submit(value)) => Some(value),
            Some(PromptResponse::AcceptDefault) => Some(default_value.to_string()),
            Some(PromptResponse::Cancel) | None => None,
        }
    }
}

/// Notifier double that records every message.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
