//! Core domain types shared between the matcher and the pattern store
//! client.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable identity of a stored known-issue pattern. Assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub i64);

impl IssueId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for IssueId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// A stored regular expression with a stable identity, used to classify
/// error text. Wire field names match the store's JSON exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownIssue {
    pub id: IssueId,
    pub regex_pattern: String,
}

impl KnownIssue {
    pub fn new(id: impl Into<IssueId>, regex_pattern: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            regex_pattern: regex_pattern.into(),
        }
    }
}

impl From<i64> for IssueId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The two kinds of action control an annotated entry can carry.
/// Exactly one is present on every reconciled entry, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    /// Error is not covered by any stored pattern; clicking starts the
    /// report workflow.
    Report,
    /// Error matches a stored pattern; clicking starts the delete workflow.
    Delete,
}

impl ControlKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlKind::Report => "report",
            ControlKind::Delete => "delete",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for parsing a [`ControlKind`] from its wire string.
#[derive(Debug, Error)]
#[error("Unknown control kind: {0}")]
pub struct UnknownControlKind(pub String);

impl std::str::FromStr for ControlKind {
    type Err = UnknownControlKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "report" => Ok(ControlKind::Report),
            "delete" => Ok(ControlKind::Delete),
            other => Err(UnknownControlKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_known_issue_wire_format() {
        let json = r#"{"id": 7, "regex_pattern": "timeout"}"#;
        let issue: KnownIssue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.id, IssueId::new(7));
        assert_eq!(issue.regex_pattern, "timeout");

        let back = serde_json::to_value(&issue).unwrap();
        assert_eq!(back["id"], 7);
        assert_eq!(back["regex_pattern"], "timeout");
    }

    #[test]
    fn test_issue_id_display_parse() {
        let id = IssueId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(IssueId::from_str("42").unwrap(), id);
        assert!(IssueId::from_str("not-a-number").is_err());
    }

    #[test]
    fn test_control_kind_roundtrip() {
        for kind in [ControlKind::Report, ControlKind::Delete] {
            let parsed = ControlKind::from_str(kind.as_str()).unwrap();
            assert_eq!(parsed, kind);
        }
        assert!(ControlKind::from_str("reload").is_err());
    }
}
