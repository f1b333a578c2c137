//! Classification of error text against the stored pattern set.
//!
//! Stateless by design: every scan re-runs matching from scratch against
//! the freshly fetched pattern list. Reflecting current state correctly
//! outranks scan cost here.

use regex::{Regex, RegexBuilder};
use tracing::warn;
use triage_protocol::KnownIssue;

/// Compile a stored pattern case-insensitively. An invalid pattern is a
/// data problem, not a program error: warn and return None so the caller
/// skips that single pattern.
pub fn try_compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(%pattern, error = %e, "Invalid stored regex; skipping pattern");
            None
        }
    }
}

/// Find the first stored issue whose pattern matches the error text.
/// Evaluation order is store order; no re-sorting, no specificity
/// tie-break.
pub fn classify<'a>(error_text: &str, issues: &'a [KnownIssue]) -> Option<&'a KnownIssue> {
    issues.iter().find(|issue| {
        try_compile(&issue.regex_pattern)
            .map(|regex| regex.is_match(error_text))
            .unwrap_or(false)
    })
}
