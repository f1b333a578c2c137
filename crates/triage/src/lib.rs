//! Triage: reactive known-issue matching for live failure reports.
//!
//! The core loop: a change observer watches the report document, filters
//! out the matcher's own writes, debounces bursts, and triggers scan
//! cycles; each cycle classifies every failure entry against the remote
//! pattern store and idempotently reconciles action controls and badges.
//!
//! The document is host-owned and shared via [`dom::DocumentHandle`]; the
//! pattern store, prompt, and notifier are collaborator traits supplied
//! by the host.

pub mod actions;
pub mod annotate;
pub mod cli;
pub mod config;
pub mod dom;
pub mod matcher;
pub mod observer;
pub mod orchestrator;
pub mod scanner;

// Re-export the surface most hosts need
pub use actions::{IssuePrompt, Notifier};
pub use config::{ConfigProvider, FileConfigProvider, MatcherConfig, StaticConfigProvider};
pub use dom::{Document, DocumentHandle, MutationRecord, NodeId, NodeSnapshot};
pub use observer::{ObserverConfig, ObserverState};
pub use orchestrator::{Orchestrator, ScanSummary};
