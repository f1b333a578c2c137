//! Request bodies for the pattern store's REST API.
//!
//! Responses reuse [`crate::types::KnownIssue`] directly; error bodies are
//! plain text and are carried verbatim by the client's error type.

use serde::{Deserialize, Serialize};

/// Body of `POST {base}` - the store assigns the id and echoes the issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIssueRequest {
    pub regex: String,
}

impl CreateIssueRequest {
    pub fn new(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
        }
    }
}
