//! Report document fixtures matching the built-in selectors.

use triage::dom::{Document, NodeSnapshot};

/// A record row whose failure entry carries the given error text.
pub fn failure_row(label: &str, error_text: &str) -> NodeSnapshot {
    NodeSnapshot::element("tr").with_child(
        NodeSnapshot::element("td")
            .with_attr("data-controller", "components--rich-text")
            .with_child(
                NodeSnapshot::element("h3")
                    .with_child(NodeSnapshot::element("strong").with_text(label)),
            )
            .with_child(
                NodeSnapshot::element("code")
                    .with_child(NodeSnapshot::element("strong").with_text(error_text)),
            ),
    )
}

/// A record row that passed; the scanner must ignore it.
pub fn passing_row(label: &str) -> NodeSnapshot {
    NodeSnapshot::element("tr").with_child(
        NodeSnapshot::element("td")
            .with_attr("data-controller", "components--rich-text")
            .with_child(
                NodeSnapshot::element("h3")
                    .with_child(NodeSnapshot::element("strong").with_text(label)),
            ),
    )
}

/// A full report snapshot: body > table > rows.
pub fn report_snapshot(rows: Vec<NodeSnapshot>) -> NodeSnapshot {
    let mut table = NodeSnapshot::element("table");
    for row in rows {
        table = table.with_child(row);
    }
    NodeSnapshot::element("body").with_child(table)
}

/// A live report document built from the given rows.
pub fn report_document(rows: Vec<NodeSnapshot>) -> Document {
    Document::from_snapshot("http://reports.local/run/1", &report_snapshot(rows))
}
