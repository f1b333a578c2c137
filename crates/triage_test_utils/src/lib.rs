//! Triage Test Utilities
//!
//! In-memory collaborator doubles and report document fixtures shared by
//! the integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use triage_test_utils::{report_document, failure_row, MemoryPatternStore};
//!
//! let doc = report_document(vec![failure_row("Iteration 1: FAIL", "boom")]);
//! let store = Arc::new(MemoryPatternStore::with_issues(vec![
//!     KnownIssue::new(1, "boom"),
//! ]));
//! ```

pub mod fixtures;
pub mod store;

// Re-exports for convenience
pub use fixtures::{failure_row, passing_row, report_document, report_snapshot};
pub use store::{MemoryPatternStore, PromptResponse, RecordingNotifier, ScriptedPrompt};
