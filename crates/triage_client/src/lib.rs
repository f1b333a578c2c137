//! Pattern store client.
//!
//! [`PatternStore`] is the capability the matcher depends on; the store
//! server itself is an external collaborator. [`HttpPatternStore`] speaks
//! its REST surface: `GET {base}`, `POST {base}`, `DELETE {base}/{id}`.

mod http;

pub use http::HttpPatternStore;

use async_trait::async_trait;
use thiserror::Error;
use triage_protocol::{IssueId, KnownIssue};

/// Pattern store operation result type.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Pattern store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure (connection refused, DNS, decode).
    #[error("Store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Remote CRUD over known-issue patterns.
///
/// `list` is called fresh at every scan; there is no client-side cache.
/// Callers degrade a failed `list` to the empty set rather than aborting
/// the scan cycle.
#[async_trait]
pub trait PatternStore: Send + Sync {
    /// Fetch all stored patterns, in store order.
    async fn list(&self) -> Result<Vec<KnownIssue>>;

    /// Store a new pattern; the store assigns the id.
    async fn create(&self, regex: &str) -> Result<KnownIssue>;

    /// Delete a pattern by id.
    async fn delete(&self, id: IssueId) -> Result<()>;
}
