//! REST implementation of [`PatternStore`] over reqwest.

use crate::{PatternStore, Result, StoreError};
use async_trait::async_trait;
use triage_protocol::{CreateIssueRequest, IssueId, KnownIssue};

/// HTTP client for the known-issues store.
pub struct HttpPatternStore {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpPatternStore {
    /// Create a client for the given base URL (e.g.
    /// `http://localhost:3000/known-issues`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn issue_url(&self, id: IssueId) -> String {
        format!("{}/{}", self.base_url, id)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl PatternStore for HttpPatternStore {
    async fn list(&self) -> Result<Vec<KnownIssue>> {
        tracing::debug!(url = %self.base_url, "Fetching known issues");
        let response = self.http_client.get(&self.base_url).send().await?;
        let issues = Self::check_status(response).await?.json().await?;
        Ok(issues)
    }

    async fn create(&self, regex: &str) -> Result<KnownIssue> {
        tracing::debug!(url = %self.base_url, "Saving known issue");
        let response = self
            .http_client
            .post(&self.base_url)
            .json(&CreateIssueRequest::new(regex))
            .send()
            .await?;
        let issue: KnownIssue = Self::check_status(response).await?.json().await?;
        tracing::info!(id = %issue.id, "Saved known issue");
        Ok(issue)
    }

    async fn delete(&self, id: IssueId) -> Result<()> {
        let url = self.issue_url(id);
        tracing::debug!(%url, "Deleting known issue");
        let response = self.http_client.delete(&url).send().await?;
        Self::check_status(response).await?;
        tracing::info!(%id, "Deleted known issue");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let store = HttpPatternStore::new("http://localhost:3000/known-issues/");
        assert_eq!(store.base_url(), "http://localhost:3000/known-issues");
    }

    #[test]
    fn test_issue_url() {
        let store = HttpPatternStore::new("http://localhost:3000/known-issues");
        assert_eq!(
            store.issue_url(IssueId::new(12)),
            "http://localhost:3000/known-issues/12"
        );
    }
}
