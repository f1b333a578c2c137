//! Shared types and wire contracts for Triage.
//!
//! Control plane only - the pattern store owns issue persistence; the
//! matcher owns document annotations. This crate holds the types both
//! sides agree on, plus the canonical defaults every component reads.

pub mod defaults;
pub mod http_types;
pub mod types;

// Re-export types for convenience
pub use http_types::CreateIssueRequest;
pub use types::{ControlKind, IssueId, KnownIssue};
