//! User-facing collaborator capabilities for the action workflows.
//!
//! The report workflow needs a human to confirm or edit the proposed
//! pattern; both workflows need a way to surface failures. Both are
//! capabilities the host supplies, independent of any event mechanism.

use async_trait::async_trait;
use tracing::error;

/// Collects or edits a proposed pattern from a human. Returns the
/// submitted string, or None when the user cancels - cancellation aborts
/// the workflow with no store mutation.
#[async_trait]
pub trait IssuePrompt: Send + Sync {
    async fn prompt(&self, title: &str, default_value: &str) -> Option<String>;
}

/// Surfaces user-visible failure messages (store create/delete errors).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Prompt that always cancels. Used by non-interactive hosts such as the
/// one-shot CLI scan, where the report workflow cannot complete.
pub struct NullPrompt;

#[async_trait]
impl IssuePrompt for NullPrompt {
    async fn prompt(&self, _title: &str, _default_value: &str) -> Option<String> {
        None
    }
}

/// Notifier that writes to stderr and the log.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        error!("{message}");
        eprintln!("{message}");
    }
}

/// Propose a pattern for an error text: the trimmed text with every regex
/// metacharacter escaped, so the default is an exact literal match the
/// user can loosen in the prompt.
pub fn proposed_pattern(error_text: &str) -> String {
    regex::escape(error_text.trim())
}
