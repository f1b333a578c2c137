//! Document scanning: candidate failure entries and their error text.

use crate::config::ScanSelectors;
use crate::dom::{Document, NodeId};
use tracing::debug;
use triage_protocol::defaults::{FAILURE_MARKER, RECORD_ANCESTOR_TAG};

/// A detected failure record: the row that flagged it, its record
/// ancestor, and the error element whose text gets classified. All nodes
/// are owned by the document and referenced by id.
#[derive(Debug, Clone)]
pub struct Entry {
    pub row: NodeId,
    pub record: NodeId,
    pub error_node: NodeId,
    pub error_text: String,
}

/// Enumerate failure entries under the current selectors.
///
/// Lazy and restartable: each call walks the document fresh, so a rescan
/// reflects the current tree. Rows whose record ancestor or error element
/// is missing are skipped with a log line - a selector miss never aborts
/// the scan.
pub fn scan_entries<'a>(
    doc: &'a Document,
    selectors: &'a ScanSelectors,
) -> impl Iterator<Item = Entry> + 'a {
    doc.query_selector_all(&selectors.row)
        .into_iter()
        .filter_map(move |row| {
            let text = doc.text_content(row);
            if !text.contains(FAILURE_MARKER) {
                return None;
            }
            let Some(record) = doc.closest_tag(row, RECORD_ANCESTOR_TAG) else {
                debug!(%row, "Row has no record ancestor; skipping");
                return None;
            };
            let Some(error_node) = doc.select_first_within(record, &selectors.error) else {
                debug!(%row, "No error element in record; skipping");
                return None;
            };
            let error_text = doc.text_excluding_marked(error_node).trim().to_string();
            Some(Entry {
                row,
                record,
                error_node,
                error_text,
            })
        })
}

/// Resolve the trimmed error text for a single row, the way a scan would.
/// Used by the action workflows, which re-resolve state at click time.
pub fn resolve_error_text(
    doc: &Document,
    row: NodeId,
    selectors: &ScanSelectors,
) -> Option<String> {
    let record = doc.closest_tag(row, RECORD_ANCESTOR_TAG)?;
    let error_node = doc.select_first_within(record, &selectors.error)?;
    Some(doc.text_excluding_marked(error_node).trim().to_string())
}
